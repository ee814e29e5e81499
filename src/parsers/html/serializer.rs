use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

/// 序列化文档
pub fn serialize_document(dom: RcDom, document_encoding: String) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .expect("Unable to serialize DOM into buffer");

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::html_to_dom;

    #[test]
    fn test_serialize_round_trips_structure() {
        let html = b"<html><head><title>Hi</title></head><body><p>Text</p></body></html>";
        let dom = html_to_dom(html, "utf-8".to_string());

        let serialized = serialize_document(dom, "utf-8".to_string());
        let output = String::from_utf8(serialized).unwrap();

        assert!(output.contains("<title>Hi</title>"));
        assert!(output.contains("<p>Text</p>"));
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let html = b"<html><body><p>a</p><p>b</p></body></html>";
        let first = serialize_document(html_to_dom(html, "utf-8".to_string()), "utf-8".to_string());
        let second = serialize_document(html_to_dom(html, "utf-8".to_string()), "utf-8".to_string());
        assert_eq!(first, second);
    }
}
