//! Dual-reply parsing: extract the agreeing and declining replies from
//! free-form generated text.
//!
//! The generator is instructed to answer in a fixed two-line tag format,
//! but models drift. Parsing therefore walks a fallback ladder and never
//! fails:
//!
//! 1. Tag lines — the first line starting with `YES:` or `긍정:` and the
//!    first starting with `NO:` or `부정:` (ASCII tags matched
//!    case-insensitively). Both must be present.
//! 2. Positional — the first two non-empty lines of the response.
//! 3. Fixed defaults for whatever is still missing.
//!
//! The result is always two non-empty strings.

use crate::models::DualReply;

/// Default agreeing reply when extraction fails.
pub const DEFAULT_POSITIVE: &str = "알겠습니다!";
/// Default declining reply when extraction fails.
pub const DEFAULT_NEGATIVE: &str = "죄송하지만 어렵습니다.";

const POSITIVE_TAGS: [&str; 2] = ["YES:", "긍정:"];
const NEGATIVE_TAGS: [&str; 2] = ["NO:", "부정:"];

/// Extract a [`DualReply`] from raw generated text. Never fails.
pub fn parse_dual_reply(raw: &str) -> DualReply {
    let positive_line = find_tagged(raw, &POSITIVE_TAGS);
    let negative_line = find_tagged(raw, &NEGATIVE_TAGS);

    if let (Some(positive), Some(negative)) = (&positive_line, &negative_line) {
        return DualReply {
            positive: non_empty_or(positive, DEFAULT_POSITIVE),
            negative: non_empty_or(negative, DEFAULT_NEGATIVE),
        };
    }

    // One or both tags missing: fall back to the first two non-empty lines.
    tracing::warn!("dual-reply tags missing, using positional fallback");
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next();
    let second = lines.next();

    DualReply {
        positive: first
            .map(|l| non_empty_or(l, DEFAULT_POSITIVE))
            .unwrap_or_else(|| DEFAULT_POSITIVE.to_string()),
        negative: second
            .map(|l| non_empty_or(l, DEFAULT_NEGATIVE))
            .unwrap_or_else(|| DEFAULT_NEGATIVE.to_string()),
    }
}

/// The remainder of the first line carrying one of `tags`, trimmed.
fn find_tagged(raw: &str, tags: &[&str]) -> Option<String> {
    raw.lines().find_map(|line| {
        let line = line.trim();
        tags.iter().find_map(|tag| {
            strip_prefix_ignore_ascii_case(line, tag).map(|rest| rest.trim().to_string())
        })
    })
}

/// `str::strip_prefix` that ignores ASCII case, so `yes:` matches `YES:`.
fn strip_prefix_ignore_ascii_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    // Also rejects prefix lengths that fall inside a multi-byte character.
    if !line.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = line.split_at(prefix.len());
    if head.eq_ignore_ascii_case(prefix) {
        Some(rest)
    } else {
        None
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_pair() {
        let reply = parse_dual_reply("YES: 좋아\nNO: 안돼");
        assert_eq!(reply.positive, "좋아");
        assert_eq!(reply.negative, "안돼");
    }

    #[test]
    fn test_korean_tags() {
        let reply = parse_dual_reply("긍정: 그래 가자\n부정: 이번엔 안 되겠다");
        assert_eq!(reply.positive, "그래 가자");
        assert_eq!(reply.negative, "이번엔 안 되겠다");
    }

    #[test]
    fn test_tags_are_case_insensitive_and_trimmed() {
        let reply = parse_dual_reply("  yes:   응 갈게  \n  no: 미안 못 가 ");
        assert_eq!(reply.positive, "응 갈게");
        assert_eq!(reply.negative, "미안 못 가");
    }

    #[test]
    fn test_tags_found_among_other_lines() {
        let raw = "두 가지 답변입니다.\nYES: 콜\n중간 설명\nNO: 다음에 보자\n끝";
        let reply = parse_dual_reply(raw);
        assert_eq!(reply.positive, "콜");
        assert_eq!(reply.negative, "다음에 보자");
    }

    #[test]
    fn test_positional_fallback_without_tags() {
        let reply = parse_dual_reply("그냥 알겠다고 해\n아니면 거절해");
        assert_eq!(reply.positive, "그냥 알겠다고 해");
        assert_eq!(reply.negative, "아니면 거절해");
    }

    #[test]
    fn test_single_tag_falls_back_to_positional() {
        // Only the YES tag present: the ladder drops to positional lines,
        // so the tagged line itself becomes the positive reply.
        let reply = parse_dual_reply("YES: 좋지\n나머지는 생략");
        assert_eq!(reply.positive, "YES: 좋지");
        assert_eq!(reply.negative, "나머지는 생략");
    }

    #[test]
    fn test_one_line_input_gets_default_negative() {
        let reply = parse_dual_reply("응 알겠어");
        assert_eq!(reply.positive, "응 알겠어");
        assert_eq!(reply.negative, DEFAULT_NEGATIVE);
    }

    #[test]
    fn test_empty_input_yields_defaults() {
        let reply = parse_dual_reply("");
        assert_eq!(reply.positive, DEFAULT_POSITIVE);
        assert_eq!(reply.negative, DEFAULT_NEGATIVE);
    }

    #[test]
    fn test_empty_tag_values_take_defaults() {
        let reply = parse_dual_reply("YES:\nNO:");
        assert_eq!(reply.positive, DEFAULT_POSITIVE);
        assert_eq!(reply.negative, DEFAULT_NEGATIVE);
    }

    #[test]
    fn test_never_empty_for_arbitrary_input() {
        for raw in ["", "\n\n\n", "   ", "x", "YES: a\nNO: b", "무엇이든"] {
            let reply = parse_dual_reply(raw);
            assert!(!reply.positive.is_empty(), "input {raw:?}");
            assert!(!reply.negative.is_empty(), "input {raw:?}");
        }
    }
}
