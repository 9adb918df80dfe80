//! Prompt compilation: deterministic rendering of a [`GenerationRequest`]
//! into the instruction text sent to the generation model.
//!
//! The template mirrors the production prompt this pipeline was tuned
//! with (Korean instruction text). Ordering is fixed: identity framing,
//! constraints, style examples, addressee info, recent transcript, style
//! analysis, and the mode-specific output instruction.
//!
//! The one hard invariant is constraint exclusivity: when user-authored
//! custom guidelines are present they are rendered verbatim under the
//! must-strictly-follow heading and the default constraint block is omitted
//! entirely — never both. The compiled text is pure data; it is passed
//! opaquely to the generation client.

use serde::Serialize;

use crate::models::GenerationRequest;

/// Which output contract to request from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// One reply, at most 2–3 sentences.
    Single,
    /// Two labeled replies (agreeing and declining) in the fixed
    /// `YES:` / `NO:` two-line format.
    Dual,
}

/// A compiled prompt: system instruction plus the triggering user message.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledPrompt {
    pub system: String,
    pub user: String,
}

/// Compiler knobs. The default constraint wording is deliberately
/// configurable — deployments have iterated on it — while the structure
/// and the exclusivity invariant are not.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Replaces the built-in default constraint block when set. Ignored
    /// whenever the request carries custom guidelines.
    pub default_constraints: Option<String>,
}

/// Render `request` into the exact instruction text for the model.
pub fn compile(request: &GenerationRequest, mode: ReplyMode, opts: &PromptOptions) -> CompiledPrompt {
    let user_name = &request.user_name;

    let constraints = match &request.custom_guidelines {
        Some(guidelines) => format!(
            "[🚨 CRITICAL: 사용자 정의 말투 규칙 - 반드시 준수할 것]\n{}",
            guidelines
        ),
        None => match &opts.default_constraints {
            Some(text) => text.clone(),
            None => default_constraints(request),
        },
    };

    let examples = if request.samples.is_empty() {
        "(말투 예시 없음)".to_string()
    } else {
        request
            .samples
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let transcript = if request.recent_turns.is_empty() {
        "(최근 대화 없음)".to_string()
    } else {
        request
            .recent_turns
            .iter()
            .map(|t| format!("{}: {}", t.role.label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let characteristics = request.style_summary.characteristics();
    let analysis = if characteristics.is_empty() {
        "(분석 중)".to_string()
    } else {
        characteristics.join("\n")
    };

    let output_instruction = match mode {
        ReplyMode::Single => format!(
            "위 모든 조건을 반영하여 {user_name}처럼 답변해줘.\n\
             답변은 자연스럽고 짧게, 최대 두 문장에서 세 문장 이내로 핵심만 말해."
        ),
        ReplyMode::Dual => format!(
            "**중요: 아래 메시지에 대해 2가지 답변을 생성해줘:**\n\
             1. **긍정적인 답변 (YES)**: 동의하거나 수락하는 긍정적인 반응\n\
             2. **부정적인 답변 (NO)**: 거절하거나 불가능하다는 부정적인 반응\n\n\
             각 답변은 {user_name}의 말투를 완벽히 모방하며, 최대 2-3문장 이내로 자연스럽고 짧게 작성해.\n\n\
             **응답 형식 (반드시 준수):**\n\
             YES: [긍정 답변]\n\
             NO: [부정 답변]"
        ),
    };

    let system = format!(
        "너는 사용자 '{user_name}'의 말투를 모방하는 AI야.\n\n\
         {constraints}\n\n\
         ⚠️ 위 규칙은 절대적이며, 어떤 경우에도 위반해서는 안 됨. 특히 문장부호 사용 금지 규칙이 있다면 반드시 지켜야 함.\n\n\
         아래 대화록은 {user_name}의 실제 말투 예시야.\n\
         {user_name}의 문장 리듬, 감탄사, 억양, 말끝, 문장 길이를 세밀하게 분석해 그대로 반영해.\n\n\
         [말투 예시]\n\
         {examples}\n\n\
         [대화 상대 정보]\n\
         이름: {partner}\n\
         관계: {category}\n\
         설명: {politeness}, {vibe}\n\n\
         [최근 대화 맥락]\n\
         {transcript}\n\n\
         [말투 분석 결과]\n\
         {analysis}\n\n\
         {output_instruction}",
        partner = request.partner_name,
        category = request.relationship.category.tag(),
        politeness = request.relationship.politeness.tag(),
        vibe = request.relationship.vibe.tag(),
    );

    let user = format!("{}: {}", request.partner_name, request.incoming_message);

    CompiledPrompt { system, user }
}

/// Built-in default constraint block, used when the user has no custom
/// guidelines and the deployment did not override the wording.
fn default_constraints(request: &GenerationRequest) -> String {
    format!(
        "[답변 제약 조건]\n\
         - 제공된 말투 예시를 참고하여 자연스럽게 답변\n\
         - 대화 상대와의 관계({})에 맞는 격식 수준 유지\n\
         - 관계 정보가 없는 대상(ACQUAINTANCE_CASUAL)에게는 격식 있는 존댓말 사용\n\
         - 최근 대화 맥락을 고려하여 일관성 있는 톤 유지",
        request.relationship.category.tag()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CandidateResult, DialogueTurn, GenerationRequest, RelationshipCategory,
        RelationshipDescriptor, Speaker, StyleSummary,
    };

    fn request() -> GenerationRequest {
        GenerationRequest {
            user_name: "민규".to_string(),
            samples: vec![
                CandidateResult {
                    text: "ㅇㅋ 바로 갈게".to_string(),
                    relevance: 0.9,
                },
                CandidateResult {
                    text: "오늘은 좀 힘들 듯".to_string(),
                    relevance: 0.8,
                },
            ],
            recent_turns: vec![
                DialogueTurn {
                    role: Speaker::Partner,
                    text: "주말에 시간 돼?".to_string(),
                    timestamp: 1,
                },
                DialogueTurn {
                    role: Speaker::User,
                    text: "토요일은 될 듯".to_string(),
                    timestamp: 2,
                },
            ],
            partner_name: "친구".to_string(),
            relationship: RelationshipDescriptor {
                category: RelationshipCategory::FriendClose,
                ..Default::default()
            },
            style_summary: StyleSummary::default(),
            custom_guidelines: None,
            incoming_message: "이번 주말에 볼래?".to_string(),
        }
    }

    #[test]
    fn test_sections_render_in_order() {
        let prompt = compile(&request(), ReplyMode::Single, &PromptOptions::default());
        let system = &prompt.system;

        let identity = system.find("민규").unwrap();
        let constraints = system.find("[답변 제약 조건]").unwrap();
        let examples = system.find("[말투 예시]").unwrap();
        let receiver = system.find("[대화 상대 정보]").unwrap();
        let transcript = system.find("[최근 대화 맥락]").unwrap();
        let analysis = system.find("[말투 분석 결과]").unwrap();
        assert!(identity < constraints);
        assert!(constraints < examples);
        assert!(examples < receiver);
        assert!(receiver < transcript);
        assert!(transcript < analysis);

        assert!(system.contains("FRIEND_CLOSE"));
        assert!(system.contains("ㅇㅋ 바로 갈게"));
        assert!(system.contains("assistant: 주말에 시간 돼?"));
        assert_eq!(prompt.user, "친구: 이번 주말에 볼래?");
    }

    #[test]
    fn test_custom_guidelines_exclude_default_constraints() {
        let mut req = request();
        req.custom_guidelines = Some("문장부호 절대 쓰지 마".to_string());

        let prompt = compile(&req, ReplyMode::Dual, &PromptOptions::default());
        assert!(prompt.system.contains("반드시 준수할 것"));
        assert!(prompt.system.contains("문장부호 절대 쓰지 마"));
        assert!(!prompt.system.contains("[답변 제약 조건]"));
    }

    #[test]
    fn test_custom_guidelines_override_configured_default_too() {
        let mut req = request();
        req.custom_guidelines = Some("이모티콘 많이 써".to_string());
        let opts = PromptOptions {
            default_constraints: Some("[배포 기본 규칙]\n- 짧게 답해".to_string()),
        };

        let prompt = compile(&req, ReplyMode::Single, &opts);
        assert!(prompt.system.contains("이모티콘 많이 써"));
        assert!(!prompt.system.contains("[배포 기본 규칙]"));
    }

    #[test]
    fn test_configured_default_constraints_replace_builtin() {
        let opts = PromptOptions {
            default_constraints: Some("[배포 기본 규칙]\n- 짧게 답해".to_string()),
        };
        let prompt = compile(&request(), ReplyMode::Single, &opts);
        assert!(prompt.system.contains("[배포 기본 규칙]"));
        assert!(!prompt.system.contains("[답변 제약 조건]"));
    }

    #[test]
    fn test_empty_context_placeholders() {
        let mut req = request();
        req.samples.clear();
        req.recent_turns.clear();

        let prompt = compile(&req, ReplyMode::Single, &PromptOptions::default());
        assert!(prompt.system.contains("(말투 예시 없음)"));
        assert!(prompt.system.contains("(최근 대화 없음)"));
        assert!(prompt.system.contains("(분석 중)"));
    }

    #[test]
    fn test_dual_mode_requests_tagged_pair() {
        let prompt = compile(&request(), ReplyMode::Dual, &PromptOptions::default());
        assert!(prompt.system.contains("YES: [긍정 답변]"));
        assert!(prompt.system.contains("NO: [부정 답변]"));
        assert!(prompt.system.contains("2가지 답변"));
    }

    #[test]
    fn test_single_mode_requests_one_reply() {
        let prompt = compile(&request(), ReplyMode::Single, &PromptOptions::default());
        assert!(prompt.system.contains("답변해줘"));
        assert!(!prompt.system.contains("YES: [긍정 답변]"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let req = request();
        let a = compile(&req, ReplyMode::Dual, &PromptOptions::default());
        let b = compile(&req, ReplyMode::Dual, &PromptOptions::default());
        assert_eq!(a.system, b.system);
        assert_eq!(a.user, b.user);
    }
}
