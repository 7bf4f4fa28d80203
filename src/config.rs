/// Policy knobs the spec leaves to the caller.
///
/// Grounded on `server/mod.rs`'s `Config` struct in the teacher crate, but
/// trimmed to what spec §10.3 calls for: buffer sizing policy and an
/// optional body cap. The teacher's timeout fields (`first_byte_timeout`,
/// `keep_alive_timeout`, ...) are deliberately not carried over — spec §5 is
/// explicit that the core has no timeout machinery, and an ambient `Config`
/// does not get to reintroduce one by the back door.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size `H` of the externally-owned client header buffer that the
    /// caller is expected to allocate per `Exchange` (spec §3, §9: "8-64 KiB
    /// typical").
    pub head_buffer_size: usize,
    /// Size `B` of `BufferedConnection`'s internal read buffer (spec §3:
    /// "recommended >= 16 KiB").
    pub connection_buffer_size: usize,
    /// Optional cap applied by `BodyReader::read_all` / `Exchange::read_all`
    /// to bound memory growth. `None` (the default) imposes no cap beyond
    /// what `Content-Length`/chunk framing already implies, matching the
    /// literal spec, which does not mandate a body cap.
    pub max_body_size: Option<u64>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            head_buffer_size: 16 * 1024,
            connection_buffer_size: 16 * 1024,
            max_body_size: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn defaults_match_spec_guidance() {
        let cfg = Config::new();
        assert_eq!(cfg.head_buffer_size, 16 * 1024);
        assert_eq!(cfg.connection_buffer_size, 16 * 1024);
        assert_eq!(cfg.max_body_size, None);
    }
}
