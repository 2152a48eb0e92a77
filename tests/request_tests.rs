use minihttpd::request::read_request;
use minihttpd::*;

#[cfg(test)]
mod decode_path_tests {
    use super::*;

    #[test]
    fn test_percent_and_plus_decoding() {
        assert_eq!(decode_path("a%20b+c"), "a b c");
        assert_eq!(decode_path("/hello%2Fworld"), "/hello/world");
        assert_eq!(decode_path("/caf%C3%A9.html"), "/café.html");
    }

    #[test]
    fn test_short_tail_passes_through() {
        assert_eq!(decode_path("%"), "%");
        assert_eq!(decode_path("%4"), "%4");
        assert_eq!(decode_path("/file%"), "/file%");
        assert_eq!(decode_path("/file%2"), "/file%2");
    }

    #[test]
    fn test_escape_at_very_end_is_decoded() {
        assert_eq!(decode_path("/a%41"), "/aA");
        assert_eq!(decode_path("%41"), "A");
    }

    #[test]
    fn test_invalid_hex_reads_leading_digits_only() {
        // "4z" reads as 4, "zz" as 0, both characters consumed either way
        assert_eq!(decode_path("%4zok"), "\u{4}ok");
        assert_eq!(decode_path("%zzok"), "\u{0}ok");
    }

    #[test]
    fn test_signed_pair_reads_like_strtol() {
        assert_eq!(decode_path("%+5x"), "\u{5}x");
        assert_eq!(decode_path("% 7x"), "\u{7}x");
        assert_eq!(decode_path("%+zx"), "\u{0}x");
        // -1 wraps to 0xff, which is not valid UTF-8 on its own
        assert_eq!(decode_path("%-1x"), "\u{fffd}x");
    }

    #[test]
    fn test_clean_input_unchanged() {
        let clean = "/static/css/main.css";
        assert_eq!(decode_path(clean), clean);
        assert_eq!(decode_path(""), "");
    }

    #[test]
    fn test_not_decoded_twice() {
        // %2520 is a literal "%20" once decoded, not a space
        assert_eq!(decode_path("%2520"), "%20");
    }
}

#[cfg(test)]
mod request_line_tests {
    use super::*;

    const SIMPLE: &str = "GET /foo HTTP/1.1\r\nHost: x\r\n\r\n";

    #[test]
    fn test_method_and_path() {
        assert_eq!(extract_method(SIMPLE), "GET");
        assert_eq!(extract_path(SIMPLE), "/foo");
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(extract_method(""), "");
        assert_eq!(extract_path(""), "");
        assert_eq!(extract_method("   \r\n "), "");
        assert_eq!(extract_path("GET"), "");
    }

    #[test]
    fn test_only_ascii_whitespace_separates_tokens() {
        let request = "GET /a\u{a0}b.txt HTTP/1.1\r\n\r\n";
        assert_eq!(extract_path(request), "/a\u{a0}b.txt");
        assert_eq!(extract_method("GE\u{85}T /x HTTP/1.1"), "GE\u{85}T");
    }

    #[test]
    fn test_path_is_raw() {
        assert_eq!(extract_path("GET /a%20b HTTP/1.1\r\n"), "/a%20b");
    }

    #[test]
    fn test_extra_whitespace_between_tokens() {
        assert_eq!(extract_method("  POST \t /submit   HTTP/1.0"), "POST");
        assert_eq!(extract_path("  POST \t /submit   HTTP/1.0"), "/submit");
    }
}

#[cfg(test)]
mod header_and_body_tests {
    use super::*;

    const FULL: &str = "GET / HTTP/1.1\r\nHost: x\r\nX-Y: z\r\n\r\nbody";

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(FULL);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Host").map(String::as_str), Some("x"));
        assert_eq!(headers.get("X-Y").map(String::as_str), Some("z"));
    }

    #[test]
    fn test_extract_body() {
        assert_eq!(extract_body(FULL), "body");
    }

    #[test]
    fn test_missing_separator_means_empty_body() {
        assert_eq!(extract_body("GET / HTTP/1.1\r\nHost: x\r\n"), "");
        assert_eq!(extract_body(""), "");
    }

    #[test]
    fn test_body_keeps_later_blank_lines() {
        assert_eq!(extract_body("POST / HTTP/1.1\r\n\r\na\r\n\r\nb"), "a\r\n\r\nb");
    }

    #[test]
    fn test_headers_stop_at_blank_line() {
        let headers = parse_headers("GET / HTTP/1.1\r\nA: 1\r\n\r\nB: 2\r\n");
        assert!(headers.contains_key("A"));
        assert!(!headers.contains_key("B"), "body lines must not become headers");
    }

    #[test]
    fn test_lines_without_separator_skipped() {
        let headers = parse_headers("GET / HTTP/1.1\r\nbroken\r\nNoSpace:value\r\nOk: yes\r\n\r\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Ok").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_header_names_are_case_sensitive() {
        let headers = parse_headers("GET / HTTP/1.1\r\nhost: a\r\nHost: b\r\n\r\n");
        assert_eq!(headers.get("host").map(String::as_str), Some("a"));
        assert_eq!(headers.get("Host").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let headers = parse_headers("GET / HTTP/1.1\r\nX: 1\r\nX: 2\r\n\r\n");
        assert_eq!(headers.get("X").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_value_splits_on_first_separator_only() {
        let headers = parse_headers("GET / HTTP/1.1\r\nX-Time: 12: 30\r\n\r\n");
        assert_eq!(headers.get("X-Time").map(String::as_str), Some("12: 30"));
    }
}

#[cfg(test)]
mod request_parse_tests {
    use super::*;

    #[test]
    fn test_full_request() {
        let request = Request::parse(b"POST /a+b%21 HTTP/1.1\r\nContent-Type: text/plain\r\n\r\nhello");
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/a b!");
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("text/plain")
        );
        assert_eq!(request.body, "hello");
    }

    #[test]
    fn test_garbage_degrades_to_empty_fields() {
        let request = Request::parse(&[0xff, 0xfe, 0x00]);
        assert!(request.headers.is_empty());
        assert_eq!(request.body, "");
        assert_eq!(request.path, "");

        let empty = Request::parse(b"");
        assert_eq!(empty, Request::default());
    }

    #[tokio::test]
    async fn test_single_read_is_capped() {
        let big = vec![b'a'; READ_BUFFER_SIZE * 3];
        let mut conn: &[u8] = &big;

        let raw = read_request(&mut conn).await.unwrap();
        assert_eq!(raw.len(), READ_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_empty_request() {
        let mut conn = tokio::io::empty();
        let raw = read_request(&mut conn).await.unwrap();
        assert!(raw.is_empty());
    }
}
