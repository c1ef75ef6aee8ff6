use lopdf::{Document, content::Content};

/// The text shown on each page of `pdf`, one string per text operation.
#[track_caller]
pub(crate) fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    let document = Document::load_mem(pdf).expect("Could not parse PDF");

    document
        .get_pages()
        .into_values()
        .map(|page_id| {
            let content = document
                .get_page_content(page_id)
                .expect("Could not get page content");
            let content = Content::decode(&content).expect("Could not decode page content");

            content
                .operations
                .iter()
                .filter(|operation| operation.operator == "Tj")
                .filter_map(|operation| operation.operands.first())
                .filter_map(|operand| operand.as_str().ok())
                .map(|bytes| bytes.iter().map(|&byte| byte as char).collect())
                .collect()
        })
        .collect()
}
