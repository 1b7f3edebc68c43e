use serde_yaml::Value;
use urlclash_converter::{clash_to_link, link_to_clash, links_to_document, ConvertError, OutputMode};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(output: &str) -> Value {
    serde_yaml::from_str(output).unwrap()
}

#[cfg(test)]
mod converter_tests {
    use super::*;

    const SS_LINK: &str = "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ=@example.com:8388#SS%20Node";
    const TROJAN_LINK: &str = "trojan://secret@trojan.example.com:443?sni=trojan.example.com#Trojan%20Node";

    #[test]
    fn test_bad_link_does_not_spoil_the_batch() {
        init_logger();
        let links = [SS_LINK, "vmess://not-base64!!", TROJAN_LINK];
        let result = link_to_clash(&links, OutputMode::Proxies);
        assert!(result.success);

        let doc = parse(&result.data);
        let proxies = doc["proxies"].as_sequence().unwrap();
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0]["name"], Value::from("SS Node"));
        assert_eq!(proxies[0]["type"], Value::from("ss"));
        assert_eq!(proxies[0]["cipher"], Value::from("aes-256-gcm"));
        assert_eq!(proxies[1]["name"], Value::from("Trojan Node"));
        assert_eq!(proxies[1]["sni"], Value::from("trojan.example.com"));
    }

    #[test]
    fn test_report_lists_skipped_links() {
        init_logger();
        let report =
            links_to_document(&[SS_LINK, "vmess://not-base64!!", "ftp://x"], OutputMode::None)
                .unwrap();
        assert_eq!(report.converted, 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(
            report.skipped[0].error,
            ConvertError::MalformedUri { .. }
        ));
        assert_eq!(
            report.skipped[1].error,
            ConvertError::UnknownScheme("ftp".to_string())
        );
    }

    #[test]
    fn test_tcp_link_keeps_host_and_path_out_of_the_entry() {
        init_logger();
        let result = link_to_clash(
            &["trojan://pw@a.com:443?type=tcp&host=cdn.com&path=%2Fx&headerType=none#t"],
            OutputMode::None,
        );
        assert!(result.success, "{}", result.data);

        let doc = parse(&result.data);
        let entry = doc[0].as_mapping().unwrap();
        assert!(!entry.contains_key("host"));
        assert!(!entry.contains_key("path"));
        assert!(!entry.contains_key("network"));
        assert_eq!(doc[0]["password"], Value::from("pw"));
    }

    #[test]
    fn test_output_modes_wrap_the_same_list() {
        init_logger();
        let links = [TROJAN_LINK];

        let proxies = parse(&link_to_clash(&links, OutputMode::Proxies).data);
        let payload = parse(&link_to_clash(&links, OutputMode::Payload).data);
        let bare = parse(&link_to_clash(&links, OutputMode::None).data);

        assert!(bare.is_sequence());
        assert_eq!(proxies["proxies"], bare);
        assert_eq!(payload["payload"]["proxies"], bare);
    }

    #[test]
    fn test_empty_and_unsupported_input_give_empty_document() {
        init_logger();
        let empty = link_to_clash::<&str>(&[], OutputMode::Proxies);
        assert!(empty.success);
        assert_eq!(parse(&empty.data)["proxies"], Value::Sequence(vec![]));

        let unsupported = link_to_clash(&["ftp://x", "   ", "plain text"], OutputMode::Proxies);
        assert!(unsupported.success);
        assert_eq!(parse(&unsupported.data)["proxies"], Value::Sequence(vec![]));
    }

    #[test]
    fn test_unknown_proxy_type_is_skipped() {
        init_logger();
        let doc = r#"
proxies:
  - name: wg
    type: wireguard
    server: 10.0.0.1
    port: 51820
    private-key: abc
  - name: ss
    type: ss
    server: 1.2.3.4
    port: 8388
    cipher: aes-128-gcm
    password: secret
"#;
        let result = clash_to_link(doc);
        assert!(result.success);
        let lines: Vec<&str> = result.data.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ss://"));
        assert!(lines[0].ends_with("#ss"));
    }

    #[test]
    fn test_unreadable_documents_fail() {
        init_logger();
        for doc in ["", "rules:\n  - MATCH,DIRECT\n", "proxies: [broken"] {
            let result = clash_to_link(doc);
            assert!(!result.success, "document: {:?}", doc);
            assert!(!result.data.is_empty());
        }
    }

    #[test]
    fn test_document_with_no_convertible_entry_succeeds_empty() {
        init_logger();
        let result = clash_to_link("proxies:\n  - name: x\n    type: snell\n    server: a\n    port: 1\n");
        assert!(result.success);
        assert_eq!(result.data, "");
    }

    #[test]
    fn test_payload_document_is_accepted() {
        init_logger();
        let doc = "payload:\n  proxies:\n    - {name: t, type: trojan, server: a.com, port: 443, password: pw}\n";
        let result = clash_to_link(doc);
        assert!(result.success);
        assert!(result.data.starts_with("trojan://pw@a.com:443"));
    }
}
