//! Line-oriented M3U parser
//!
//! Walks the playlist once, building one channel at a time: an `#EXTINF`
//! line opens a channel, option directives enrich it, and the first plain
//! line becomes its manifest URI. Channels missing a name or URI are dropped
//! at the end rather than reported as errors.

use std::collections::HashMap;

use tracing::warn;

use crate::playlist::channel::Channel;

const EXTINF_MARKER: &str = "#EXTINF:";
const LICENSE_KEY_MARKER: &str = "#KODIPROP:inputstream.adaptive.license_key=";
const USER_AGENT_MARKER: &str = "#EXTVLCOPT:http-user-agent=";
const HTTP_OPTIONS_MARKER: &str = "#EXTHTTP:";

/// Parse raw M3U text into an ordered list of channels.
///
/// Pure and restartable: the same input always yields the same output, and
/// unknown directives are skipped silently.
pub fn parse(text: &str) -> Vec<Channel> {
    let mut channels: Vec<Channel> = Vec::new();
    let mut current: Option<Channel> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix(EXTINF_MARKER) {
            if let Some(finished) = current.take() {
                channels.push(finished);
            }

            let mut channel = Channel::default();

            // The channel name follows the last comma on the line.
            if let Some((_, name)) = rest.rsplit_once(',') {
                channel.name = name.trim().to_string();
            }

            channel.logo_url = extract_attribute(rest, "tvg-logo").filter(|l| !l.is_empty());

            if let Some(group) = extract_attribute(rest, "group-title") {
                let group = group.trim();
                if !group.is_empty() {
                    channel.group = group.to_string();
                }
            }

            current = Some(channel);
        } else if let Some(rest) = line.strip_prefix(LICENSE_KEY_MARKER) {
            if let Some(channel) = current.as_mut() {
                let parts: Vec<&str> = rest.split(':').collect();
                if parts.len() == 2 {
                    channel.drm_key_id = Some(parts[0].to_string());
                    channel.drm_key = Some(parts[1].to_string());
                }
            }
        } else if let Some(rest) = line.strip_prefix(USER_AGENT_MARKER) {
            if let Some(channel) = current.as_mut() {
                channel.user_agent = Some(rest.to_string());
            }
        } else if let Some(rest) = line.strip_prefix(HTTP_OPTIONS_MARKER) {
            if let Some(channel) = current.as_mut() {
                match serde_json::from_str::<HashMap<String, String>>(rest) {
                    Ok(params) => channel.auth_params = Some(params),
                    Err(e) => warn!("Ignoring unparseable #EXTHTTP directive: {e}"),
                }
            }
        } else if !line.is_empty() && !line.starts_with('#') {
            if let Some(channel) = current.as_mut() {
                if channel.manifest_uri.is_empty() {
                    channel.manifest_uri = line.to_string();
                }
            }
        }
    }

    if let Some(finished) = current.take() {
        channels.push(finished);
    }

    channels.retain(|c| !c.name.is_empty() && !c.manifest_uri.is_empty());
    channels
}

/// Distinct group titles across a channel list, sorted alphabetically.
pub fn groups(channels: &[Channel]) -> Vec<String> {
    let mut groups: Vec<String> = channels.iter().map(|c| c.group.clone()).collect();
    groups.sort();
    groups.dedup();
    groups
}

/// Case-insensitive substring search over channel names.
pub fn search<'a>(channels: &'a [Channel], query: &str) -> Vec<&'a Channel> {
    let query = query.to_lowercase();
    channels
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&query))
        .collect()
}

/// Extract a quoted `name="value"` attribute from an `#EXTINF` line.
fn extract_attribute(text: &str, name: &str) -> Option<String> {
    let pattern = format!("{name}=\"");
    let start = text.find(&pattern)? + pattern.len();
    let end = text[start..].find('"')?;
    Some(text[start..start + end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::channel::DEFAULT_GROUP;

    #[test]
    fn test_parse_single_channel() {
        let text = "#EXTINF:-1 tvg-logo=\"http://x/l.png\" group-title=\"News\",BBC\nhttp://x/bbc.m3u8\n";
        let channels = parse(text);

        assert_eq!(channels.len(), 1);
        let channel = &channels[0];
        assert_eq!(channel.name, "BBC");
        assert_eq!(channel.logo_url.as_deref(), Some("http://x/l.png"));
        assert_eq!(channel.group, "News");
        assert_eq!(channel.manifest_uri, "http://x/bbc.m3u8");
        assert_eq!(channel.drm_key_id, None);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "#EXTM3U\n#EXTINF:-1,One\nhttp://x/1.mpd\n#EXTINF:-1,Two\nhttp://x/2.mpd\n";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_parse_defaults_group() {
        let text = "#EXTINF:-1,Plain\nhttp://x/plain.m3u8\n";
        let channels = parse(text);
        assert_eq!(channels[0].group, DEFAULT_GROUP);
    }

    #[test]
    fn test_parse_name_after_last_comma() {
        let text = "#EXTINF:-1 group-title=\"News, World\",BBC One\nhttp://x/bbc1.mpd\n";
        let channels = parse(text);
        assert_eq!(channels[0].name, "BBC One");
        assert_eq!(channels[0].group, "News, World");
    }

    #[test]
    fn test_parse_clearkey_pair() {
        let text = "#EXTINF:-1,Film\n\
                    #KODIPROP:inputstream.adaptive.license_key=abcd1234:ef567890\n\
                    http://x/film.mpd\n";
        let channels = parse(text);
        assert_eq!(channels[0].drm_key_id.as_deref(), Some("abcd1234"));
        assert_eq!(channels[0].drm_key.as_deref(), Some("ef567890"));
        assert!(channels[0].has_drm());
    }

    #[test]
    fn test_parse_clearkey_rejects_wrong_arity() {
        let text = "#EXTINF:-1,Film\n\
                    #KODIPROP:inputstream.adaptive.license_key=abcd1234\n\
                    http://x/film.mpd\n";
        let channels = parse(text);
        assert_eq!(channels[0].drm_key_id, None);
        assert_eq!(channels[0].drm_key, None);

        let text = "#EXTINF:-1,Film\n\
                    #KODIPROP:inputstream.adaptive.license_key=a:b:c\n\
                    http://x/film.mpd\n";
        assert!(!parse(text)[0].has_drm());
    }

    #[test]
    fn test_parse_user_agent_option() {
        let text = "#EXTINF:-1,UA\n\
                    #EXTVLCOPT:http-user-agent=ExoPlayerLib/2.11.6\n\
                    http://x/ua.mpd\n";
        let channels = parse(text);
        assert_eq!(channels[0].user_agent.as_deref(), Some("ExoPlayerLib/2.11.6"));
    }

    #[test]
    fn test_parse_http_options() {
        let text = "#EXTINF:-1,Auth\n\
                    #EXTHTTP:{\"cookie\":\"session=abc123\"}\n\
                    http://x/auth.mpd\n";
        let channels = parse(text);
        let params = channels[0].auth_params.as_ref().unwrap();
        assert_eq!(params.get("cookie").map(String::as_str), Some("session=abc123"));
    }

    #[test]
    fn test_parse_bad_http_options_ignored() {
        let text = "#EXTINF:-1,Auth\n\
                    #EXTHTTP:{not json}\n\
                    http://x/auth.mpd\n";
        let channels = parse(text);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].auth_params, None);
    }

    #[test]
    fn test_parse_drops_channel_without_uri() {
        let text = "#EXTINF:-1,No Stream\n#EXTINF:-1,Good\nhttp://x/good.m3u8\n";
        let channels = parse(text);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Good");
    }

    #[test]
    fn test_parse_drops_channel_without_name() {
        let text = "#EXTINF:-1 tvg-logo=\"http://x/l.png\"\nhttp://x/anon.m3u8\n";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_parse_takes_first_uri_only() {
        let text = "#EXTINF:-1,One\nhttp://x/first.m3u8\nhttp://x/second.m3u8\n";
        let channels = parse(text);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].manifest_uri, "http://x/first.m3u8");
    }

    #[test]
    fn test_parse_ignores_unknown_directives() {
        let text = "#EXTM3U\n#PLAYLIST:whatever\n#EXTINF:-1,One\n#EXTGRP:ignored\nhttp://x/1.m3u8\n";
        let channels = parse(text);
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_parse_handles_crlf() {
        let text = "#EXTINF:-1,One\r\nhttp://x/1.m3u8\r\n#EXTINF:-1,Two\r\nhttp://x/2.m3u8\r\n";
        let channels = parse(text);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].manifest_uri, "http://x/2.m3u8");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn test_groups_sorted_and_deduped() {
        let text = "#EXTINF:-1 group-title=\"Sports\",A\nhttp://x/a\n\
                    #EXTINF:-1 group-title=\"News\",B\nhttp://x/b\n\
                    #EXTINF:-1 group-title=\"Sports\",C\nhttp://x/c\n";
        let channels = parse(text);
        assert_eq!(groups(&channels), vec!["News".to_string(), "Sports".to_string()]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let text = "#EXTINF:-1,BBC News\nhttp://x/a\n#EXTINF:-1,CNN\nhttp://x/b\n";
        let channels = parse(text);
        let hits = search(&channels, "bbc");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "BBC News");
    }
}
