//! HLS playlist rewriting for proxied streams

/// Makes relative `.ts` segment references absolute against `base_url`
///
/// Tags, comments and segments that already carry a scheme are left alone.
pub fn rewrite_segments(content: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut out = String::with_capacity(content.len() + 64);

    for line in content.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let is_segment = !body.starts_with('#') && !body.contains("://") && body.contains(".ts");

        if is_segment {
            out.push_str(base);
            out.push('/');
            out.push_str(body.trim_start_matches('/'));
            out.push_str(&line[body.len()..]);
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Single-variant master playlist pointing straight at `url`
///
/// Served when the upstream playlist cannot be fetched so the player can
/// try the url itself.
pub fn fallback_playlist(url: &str) -> String {
    format!("#EXTM3U\n#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=1\n{}", url)
}
