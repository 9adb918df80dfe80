//! Core data types for the reply-drafting pipeline.
//!
//! The persistent type is [`ToneSample`]; everything else here is ephemeral,
//! owned by the single request that creates it, and discarded once a reply
//! has been produced.

use serde::{Deserialize, Serialize};

/// Relationship category between the user and a conversation partner.
///
/// Stored as SCREAMING_SNAKE tags (e.g. `"FRIEND_CLOSE"`) and rendered
/// with the same tags inside compiled prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipCategory {
    FriendClose,
    FriendCasual,
    Family,
    Coworker,
    Senior,
    Junior,
    RomanticPartner,
    AcquaintanceClose,
    AcquaintanceCasual,
    Professional,
}

impl RelationshipCategory {
    /// The storage/prompt tag for this category.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FriendClose => "FRIEND_CLOSE",
            Self::FriendCasual => "FRIEND_CASUAL",
            Self::Family => "FAMILY",
            Self::Coworker => "COWORKER",
            Self::Senior => "SENIOR",
            Self::Junior => "JUNIOR",
            Self::RomanticPartner => "ROMANTIC_PARTNER",
            Self::AcquaintanceClose => "ACQUAINTANCE_CLOSE",
            Self::AcquaintanceCasual => "ACQUAINTANCE_CASUAL",
            Self::Professional => "PROFESSIONAL",
        }
    }

    /// Parse a storage tag. Unknown tags return `None` rather than erroring
    /// so that rows written by newer revisions degrade gracefully.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FRIEND_CLOSE" => Some(Self::FriendClose),
            "FRIEND_CASUAL" => Some(Self::FriendCasual),
            "FAMILY" => Some(Self::Family),
            "COWORKER" => Some(Self::Coworker),
            "SENIOR" => Some(Self::Senior),
            "JUNIOR" => Some(Self::Junior),
            "ROMANTIC_PARTNER" => Some(Self::RomanticPartner),
            "ACQUAINTANCE_CLOSE" => Some(Self::AcquaintanceClose),
            "ACQUAINTANCE_CASUAL" => Some(Self::AcquaintanceCasual),
            "PROFESSIONAL" => Some(Self::Professional),
            _ => None,
        }
    }
}

/// Politeness register used toward a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolitenessLevel {
    Formal,
    Polite,
    Casual,
}

impl PolitenessLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Formal => "FORMAL",
            Self::Polite => "POLITE",
            Self::Casual => "CASUAL",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FORMAL" => Some(Self::Formal),
            "POLITE" => Some(Self::Polite),
            "CASUAL" => Some(Self::Casual),
            _ => None,
        }
    }
}

/// Overall conversational mood toward a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VibeType {
    Serious,
    Calm,
    Playful,
    Energetic,
    Caring,
    Direct,
}

impl VibeType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Serious => "SERIOUS",
            Self::Calm => "CALM",
            Self::Playful => "PLAYFUL",
            Self::Energetic => "ENERGETIC",
            Self::Caring => "CARING",
            Self::Direct => "DIRECT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SERIOUS" => Some(Self::Serious),
            "CALM" => Some(Self::Calm),
            "PLAYFUL" => Some(Self::Playful),
            "ENERGETIC" => Some(Self::Energetic),
            "CARING" => Some(Self::Caring),
            "DIRECT" => Some(Self::Direct),
            _ => None,
        }
    }
}

/// How the user addresses a given partner: category, register, and mood.
///
/// The `Default` value is used whenever no relationship record exists for a
/// partner — an acquaintance addressed in a polite, calm register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    pub category: RelationshipCategory,
    pub politeness: PolitenessLevel,
    pub vibe: VibeType,
}

impl Default for RelationshipDescriptor {
    fn default() -> Self {
        Self {
            category: RelationshipCategory::AcquaintanceCasual,
            politeness: PolitenessLevel::Polite,
            vibe: VibeType::Calm,
        }
    }
}

/// One historical utterance authored by the target user.
///
/// A sample's embedding, once computed, is immutable. Samples without an
/// embedding exist (ingestion writes them first, the backfill job embeds
/// them later) but are excluded from retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneSample {
    pub id: String,
    pub user_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub category: Option<RelationshipCategory>,
    pub politeness: Option<PolitenessLevel>,
    pub vibe: Option<VibeType>,
    /// Unix timestamp of collection.
    pub created_at: i64,
}

/// A retrieved sample paired with its relevance to the query, in `[0, 1]`.
///
/// Ephemeral; produced per-query and discarded after ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub text: String,
    pub relevance: f64,
}

/// Who authored a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Partner,
}

impl Speaker {
    /// Transcript label used when rendering recent turns into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Partner => "assistant",
        }
    }
}

/// A single turn of recent dialogue between the user and a partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: Speaker,
    pub text: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

/// Aggregated style statistics for a user, derived from their tone samples:
/// the dominant politeness register, the dominant vibe, and how many samples
/// the aggregation saw.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleSummary {
    pub politeness: Option<PolitenessLevel>,
    pub vibe: Option<VibeType>,
    pub sample_count: i64,
}

impl StyleSummary {
    /// Render the summary as the characteristic lines the prompt embeds.
    pub fn characteristics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(p) = self.politeness {
            lines.push(format!("존댓말/반말: {}", p.tag()));
        }
        if let Some(v) = self.vibe {
            lines.push(format!("말투 분위기: {}", v.tag()));
        }
        if self.sample_count > 0 {
            lines.push(format!("분석된 대화 샘플: {}개", self.sample_count));
        }
        lines
    }
}

/// Everything the prompt compiler needs for one generation call.
///
/// Assembled per request; `custom_guidelines`, when present, strictly
/// supersede the default constraint block in the compiled prompt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Display name of the target user whose style is being imitated.
    pub user_name: String,
    /// Ranked style examples, most-relevant-yet-diverse first.
    pub samples: Vec<CandidateResult>,
    /// Recent dialogue, chronological (oldest first).
    pub recent_turns: Vec<DialogueTurn>,
    /// Display name of the addressee.
    pub partner_name: String,
    pub relationship: RelationshipDescriptor,
    pub style_summary: StyleSummary,
    pub custom_guidelines: Option<String>,
    /// The incoming message being replied to.
    pub incoming_message: String,
}

/// A pair of generated replies to the same incoming message: one agreeing,
/// one declining. Both strings are guaranteed non-empty by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DualReply {
    pub positive: String,
    pub negative: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tag_roundtrip() {
        for cat in [
            RelationshipCategory::FriendClose,
            RelationshipCategory::Family,
            RelationshipCategory::RomanticPartner,
            RelationshipCategory::Professional,
        ] {
            assert_eq!(RelationshipCategory::from_tag(cat.tag()), Some(cat));
        }
    }

    #[test]
    fn test_unknown_tags_are_none() {
        assert_eq!(RelationshipCategory::from_tag("BESTIE"), None);
        assert_eq!(PolitenessLevel::from_tag(""), None);
        assert_eq!(VibeType::from_tag("playful"), None);
    }

    #[test]
    fn test_default_relationship_is_polite_acquaintance() {
        let d = RelationshipDescriptor::default();
        assert_eq!(d.category, RelationshipCategory::AcquaintanceCasual);
        assert_eq!(d.politeness, PolitenessLevel::Polite);
        assert_eq!(d.vibe, VibeType::Calm);
    }

    #[test]
    fn test_style_summary_characteristics() {
        let summary = StyleSummary {
            politeness: Some(PolitenessLevel::Casual),
            vibe: Some(VibeType::Playful),
            sample_count: 42,
        };
        let lines = summary.characteristics();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("CASUAL"));
        assert!(lines[1].contains("PLAYFUL"));
        assert!(lines[2].contains("42"));
    }

    #[test]
    fn test_empty_style_summary_has_no_characteristics() {
        assert!(StyleSummary::default().characteristics().is_empty());
    }
}
