use loadtach_config::load_toml;
use rstest::rstest;

#[rstest]
fn empty_document_is_valid_with_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults validate");
    assert_eq!(cfg.acquisition.timeout_ms, 200);
    assert_eq!(cfg.tach.glitch_reject_us, 100);
    assert_eq!(cfg.tach.default_ppr, 1);
    assert_eq!(cfg.protocol.max_line_len, 127);
    assert_eq!(cfg.storage.size, 64);
    assert_eq!(cfg.storage.address, 0);
    assert_eq!(cfg.identity.fw, None);
}

#[rstest]
fn full_document_parses() {
    let toml = r#"
[identity]
vendor = "Acme"
device = "RP2040"
fw = "1.1.0"

[pins]
hx711_dt = 5
hx711_sck = 6
hx711_gain_pulses = 27
tach_in = 21
tach_pullup = false

[acquisition]
timeout_ms = 150

[tach]
glitch_reject_us = 250
default_ppr = 4

[protocol]
max_line_len = 64

[storage]
path = "/var/lib/loadtach/eeprom.bin"
size = 128
address = 32

[logging]
file = "/tmp/loadtach.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.identity.device, "RP2040");
    assert_eq!(cfg.pins.tach_in, 21);
    assert!(!cfg.pins.tach_pullup);
    assert_eq!(cfg.tach.default_ppr, 4);
    assert_eq!(cfg.storage.address, 32);
}

#[rstest]
#[case("[acquisition]\ntimeout_ms = 0\n", "acquisition.timeout_ms must be >= 1")]
#[case("[tach]\ndefault_ppr = 0\n", "tach.default_ppr must be >= 1")]
#[case("[protocol]\nmax_line_len = 0\n", "protocol.max_line_len")]
#[case("[storage]\nsize = 64\naddress = 50\n", "must fit within storage.size")]
#[case("[storage]\naddress = 9223372036854775807\n", "must fit within storage.size")]
#[case("[pins]\nhx711_gain_pulses = 24\n", "hx711_gain_pulses")]
#[case("[pins]\nhx711_dt = 3\nhx711_sck = 3\n", "must be distinct")]
#[case("[identity]\nvendor = \"two words\"\n", "identity.vendor")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?}, got: {err}"
    );
}

#[rstest]
fn unknown_types_fail_to_parse() {
    assert!(load_toml("[tach]\ndefault_ppr = \"one\"\n").is_err());
}

#[rstest]
fn storage_address_overflow_is_rejected() {
    let mut cfg = loadtach_config::Config::default();
    cfg.storage.address = usize::MAX;
    let err = cfg.validate().expect_err("address + record length overflows");
    assert!(format!("{err}").contains("must fit within storage.size"));
}
