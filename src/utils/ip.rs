use std::net::IpAddr;

use actix_web::HttpRequest;

/// 取请求来源地址: 优先 Forwarded / X-Forwarded-For 的第一个地址, 否则使用对端地址。
/// 清理后不是合法 IP 的值 (客户端可随意伪造请求头) 一律丢弃。
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let info = req.connection_info();
    let cleaned = clean_ipv4(info.realip_remote_addr()?);
    cleaned.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// 规范化地址:
/// - 去掉端口 (`1.2.3.4:5678`)
/// - IPv4 映射地址 `::ffff:1.2.3.4` -> `1.2.3.4`
/// - 回环 `::1` -> `127.0.0.1`
pub fn clean_ipv4(raw: &str) -> String {
    let ip = raw.trim();
    let ip = ip
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map(|(inner, _)| inner)
        .unwrap_or(ip);

    if ip == "::1" {
        return "127.0.0.1".to_string();
    }
    if let Some(v4) = ip.strip_prefix("::ffff:") {
        return v4.to_string();
    }
    // 仅有一个冒号时视为 IPv4:port
    match ip.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => ip.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_clean_ipv4() {
        assert_eq!(clean_ipv4("::ffff:192.168.1.10"), "192.168.1.10");
        assert_eq!(clean_ipv4("::1"), "127.0.0.1");
        assert_eq!(clean_ipv4("[::1]:8080"), "127.0.0.1");
        assert_eq!(clean_ipv4("10.0.0.5:51234"), "10.0.0.5");
        assert_eq!(clean_ipv4(" 10.0.0.5 "), "10.0.0.5");
        assert_eq!(clean_ipv4("2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .to_http_request();
        assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_drops_malformed_forwarded_for() {
        let oversized = "x".repeat(100);
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", oversized.as_str()))
            .to_http_request();
        assert_eq!(client_ip(&req), None);

        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "::ffff:198.51.100.4"))
            .to_http_request();
        assert_eq!(client_ip(&req).as_deref(), Some("198.51.100.4"));
    }
}
