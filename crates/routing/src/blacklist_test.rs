//! Tests for Blacklist

use super::*;

fn localhost_blacklist() -> Blacklist {
    Blacklist::new(vec![IpRange::parse("127.0.0.0", "127.0.0.2").unwrap()])
}

fn is_blacklisted(blacklist: &Blacklist, url: &str) -> bool {
    matches!(blacklist.check_url(url), Err(RoutingError::Blacklisted { .. }))
}

// =============================================================================
// Boundary tests
// =============================================================================

#[test]
fn test_range_bounds_rejected() {
    let blacklist = localhost_blacklist();

    assert!(!blacklist.validate("syslog://127.0.0.0:514"));
    assert!(!blacklist.validate("syslog://127.0.0.1:514"));
    assert!(!blacklist.validate("syslog://127.0.0.2:514"));
}

#[test]
fn test_outside_range_allowed() {
    let blacklist = localhost_blacklist();

    assert!(blacklist.validate("syslog://127.0.0.3:514"));
    assert!(blacklist.validate("syslog://126.255.255.255:514"));
}

#[test]
fn test_empty_blacklist_allows_everything() {
    let blacklist = Blacklist::empty();

    assert!(blacklist.is_empty());
    assert!(blacklist.validate("syslog://127.0.0.1:514"));
    assert!(blacklist.validate("https://10.0.0.1/drain"));
    assert!(blacklist.validate("not a url"));
}

#[test]
fn test_special_scheme_hosts() {
    let blacklist = localhost_blacklist();

    assert!(!blacklist.validate("https://127.0.0.1/logs"));
    assert!(blacklist.validate("https://127.0.0.5/logs"));
}

#[test]
fn test_ipv6_host() {
    let blacklist = Blacklist::new(vec![IpRange::parse("::1", "::1").unwrap()]);

    assert!(!blacklist.validate("syslog://[::1]:514"));
    assert!(blacklist.validate("syslog://[::2]:514"));
}

#[test]
fn test_first_matching_range_reports_ip() {
    let blacklist = Blacklist::new(vec![
        IpRange::parse("10.0.0.0", "10.0.0.255").unwrap(),
        IpRange::parse("127.0.0.0", "127.0.0.2").unwrap(),
    ]);

    let err = blacklist.check_url("syslog://127.0.0.1:514").unwrap_err();
    assert!(matches!(
        err,
        RoutingError::Blacklisted { ip, .. } if ip == "127.0.0.1".parse::<IpAddr>().unwrap()
    ));
}

#[test]
fn test_ipv4_shorthand_hosts_rejected() {
    let blacklist = localhost_blacklist();

    assert!(is_blacklisted(&blacklist, "syslog://127.1:514"));
    assert!(is_blacklisted(&blacklist, "syslog://2130706433:514"));
    assert!(is_blacklisted(&blacklist, "tcp://0x7f.0.0.1:9000"));
    assert!(is_blacklisted(&blacklist, "tcp://0177.0.0.2:9000"));
    assert!(blacklist.validate("syslog://127.3:514"));
}

#[test]
fn test_url_host_ip_normalizes_shorthand() {
    let url = Url::parse("syslog://127.1:514").unwrap();
    assert_eq!(url_host_ip(&url), Some("127.0.0.1".parse().unwrap()));

    let url = Url::parse("syslog://logs.example.com:514").unwrap();
    assert_eq!(url_host_ip(&url), None);
}

// =============================================================================
// Ambiguous destination tests
// =============================================================================

#[test]
fn test_domain_host_allowed_by_default() {
    let blacklist = localhost_blacklist();
    assert!(blacklist.validate("syslog://localhost:514"));
}

#[test]
fn test_unparseable_url_allowed_by_default() {
    let blacklist = localhost_blacklist();
    assert!(blacklist.validate("::::"));
}

#[test]
fn test_strict_rejects_domain_host() {
    let blacklist = localhost_blacklist().strict(true);

    let err = blacklist.check_url("syslog://logs.example.com:514").unwrap_err();
    assert!(matches!(err, RoutingError::UnresolvedHost { ref host } if host == "logs.example.com"));
}

#[test]
fn test_strict_rejects_unparseable_url() {
    let blacklist = localhost_blacklist().strict(true);

    let err = blacklist.check_url("::::").unwrap_err();
    assert!(matches!(err, RoutingError::InvalidUrl { .. }));
}

#[test]
fn test_strict_still_allows_clean_ip() {
    let blacklist = localhost_blacklist().strict(true);
    assert!(blacklist.is_strict());
    assert!(blacklist.validate("syslog://10.1.1.1:514"));
}

// =============================================================================
// Consumer address tests
// =============================================================================

#[test]
fn test_is_ip_allowed() {
    let blacklist = localhost_blacklist();

    assert!(!blacklist.is_ip_allowed("127.0.0.1".parse().unwrap()));
    assert!(blacklist.is_ip_allowed("127.0.0.3".parse().unwrap()));
    assert!(blacklist.is_ip_allowed("::1".parse().unwrap()));
}
