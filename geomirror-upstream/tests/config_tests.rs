use geomirror_upstream::UpstreamConfig;

#[test]
fn default_base_url() {
    let config = UpstreamConfig::default();
    assert_eq!(config.base_url, "https://geois2.orb.ru/api");
}

#[test]
fn default_timeout() {
    let config = UpstreamConfig::default();
    assert_eq!(config.timeout_secs, 30);
}

#[test]
fn default_layer() {
    let config = UpstreamConfig::default();
    assert_eq!(config.default_layer_id, 8863);
}

#[test]
fn partial_config_keeps_defaults() {
    let config: UpstreamConfig = serde_json::from_str(r#"{"username": "u", "password": "p"}"#).unwrap();
    assert_eq!(config.username, "u");
    assert_eq!(config.password, "p");
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.default_layer_id, 8863);
}
