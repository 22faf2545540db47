//! Reputation engine - pure mapping from a reputation score to its tier
//! and the effects that tier has on NPC cooperation, pricing and services.
//!
//! Nothing here touches storage. Callers read the score from the world store
//! and ask this module what it means.

use serde::{Deserialize, Serialize};

pub const MIN_REPUTATION: i32 = -100;
pub const MAX_REPUTATION: i32 = 100;

/// Clamp any reputation value into the legal range
pub fn clamp_reputation(value: i64) -> i32 {
    value.clamp(MIN_REPUTATION as i64, MAX_REPUTATION as i64) as i32
}

/// The eight reputation bands, ordered from best standing to worst.
///
/// The declaration order is the tier index used by [`can_access_service`]:
/// a lower index means a higher standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReputationTier {
    Heroic,
    VeryFriendly,
    Friendly,
    Neutral,
    SlightlyHostile,
    Hostile,
    VeryHostile,
    Enemy,
}

impl ReputationTier {
    pub const ALL: [ReputationTier; 8] = [
        ReputationTier::Heroic,
        ReputationTier::VeryFriendly,
        ReputationTier::Friendly,
        ReputationTier::Neutral,
        ReputationTier::SlightlyHostile,
        ReputationTier::Hostile,
        ReputationTier::VeryHostile,
        ReputationTier::Enemy,
    ];

    /// Thresholds are inclusive lower bounds
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 80 => Self::Heroic,
            s if s >= 60 => Self::VeryFriendly,
            s if s >= 20 => Self::Friendly,
            s if s >= 0 => Self::Neutral,
            s if s >= -20 => Self::SlightlyHostile,
            s if s >= -40 => Self::Hostile,
            s if s >= -60 => Self::VeryHostile,
            _ => Self::Enemy,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Heroic => "Heroic",
            Self::VeryFriendly => "Very Friendly",
            Self::Friendly => "Friendly",
            Self::Neutral => "Neutral",
            Self::SlightlyHostile => "Slightly Hostile",
            Self::Hostile => "Hostile",
            Self::VeryHostile => "Very Hostile",
            Self::Enemy => "Enemy",
        }
    }

    /// Willingness of NPCs to help, in `[0, 1]`
    pub fn cooperation(self) -> f64 {
        match self {
            Self::Heroic => 1.0,
            Self::VeryFriendly => 0.9,
            Self::Friendly => 0.8,
            Self::Neutral => 0.6,
            Self::SlightlyHostile => 0.4,
            Self::Hostile => 0.2,
            Self::VeryHostile => 0.1,
            Self::Enemy => 0.0,
        }
    }

    /// Multiplier applied to shop prices, in `[0.5, 3.0]`
    pub fn price_modifier(self) -> f64 {
        match self {
            Self::Heroic => 0.5,
            Self::VeryFriendly => 0.7,
            Self::Friendly => 0.9,
            Self::Neutral => 1.0,
            Self::SlightlyHostile => 1.2,
            Self::Hostile => 1.5,
            Self::VeryHostile => 2.0,
            Self::Enemy => 3.0,
        }
    }

    pub fn special_actions(self) -> &'static [SpecialAction] {
        use SpecialAction::*;
        match self {
            Self::Heroic => &[FreeService, SpecialInformation, PreciousGift],
            Self::VeryFriendly => &[Discount, ExtraInformation, KindAdvice],
            Self::Friendly => &[SmallDiscount, BasicInformation],
            Self::Neutral => &[BasicService],
            Self::SlightlyHostile => &[InformationLimit, Wariness],
            Self::Hostile => &[HighPrice, Rude, InformationRefusal],
            Self::VeryHostile => &[ServiceRefusal, FleeAttempt, CallGuards],
            Self::Enemy => &[StartCombat, Flee, CallGuards, Threat],
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            Self::Heroic => "It is an honor to meet you, hero! How may I serve you?",
            Self::VeryFriendly => "Welcome back, friend! What can I do for you today?",
            Self::Friendly => "Hello there, good to see you.",
            Self::Neutral => "Hello. What do you need?",
            Self::SlightlyHostile => "...What do you want?",
            Self::Hostile => "You again. Make it quick.",
            Self::VeryHostile => "Stay back! I want nothing to do with you!",
            Self::Enemy => "Guards! It's them! Somebody call the guards!",
        }
    }

    pub fn tone(self) -> &'static str {
        match self {
            Self::Heroic => "reverent",
            Self::VeryFriendly => "warm",
            Self::Friendly => "friendly",
            Self::Neutral => "matter-of-fact",
            Self::SlightlyHostile => "wary",
            Self::Hostile => "rude",
            Self::VeryHostile => "fearful",
            Self::Enemy => "hostile",
        }
    }
}

impl std::fmt::Display for ReputationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions an NPC may take toward the player at a given tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAction {
    FreeService,
    SpecialInformation,
    PreciousGift,
    Discount,
    ExtraInformation,
    KindAdvice,
    SmallDiscount,
    BasicInformation,
    BasicService,
    InformationLimit,
    Wariness,
    HighPrice,
    Rude,
    InformationRefusal,
    ServiceRefusal,
    FleeAttempt,
    CallGuards,
    StartCombat,
    Flee,
    Threat,
}

impl SpecialAction {
    pub fn description(self) -> &'static str {
        match self {
            Self::FreeService => "free service",
            Self::SpecialInformation => "special information",
            Self::PreciousGift => "precious gift",
            Self::Discount => "discount",
            Self::ExtraInformation => "extra information",
            Self::KindAdvice => "kind advice",
            Self::SmallDiscount => "small discount",
            Self::BasicInformation => "basic information",
            Self::BasicService => "basic service",
            Self::InformationLimit => "limited information",
            Self::Wariness => "wariness",
            Self::HighPrice => "inflated prices",
            Self::Rude => "rudeness",
            Self::InformationRefusal => "refuses to share information",
            Self::ServiceRefusal => "refuses service",
            Self::FleeAttempt => "tries to get away",
            Self::CallGuards => "calls the guards",
            Self::StartCombat => "attacks on sight",
            Self::Flee => "flees",
            Self::Threat => "makes threats",
        }
    }
}

/// `max(1, round(base_price * modifier(tier(reputation))))`
pub fn apply_to_price(base_price: u32, reputation: i32) -> u32 {
    let modifier = ReputationTier::from_score(reputation).price_modifier();
    let adjusted = (base_price as f64 * modifier).round() as u32;
    adjusted.max(1)
}

/// Services gated on reputation. Each names the most hostile tier it still serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    BasicShop,
    SpecialItems,
    PremiumService,
    HeroOnly,
    Information,
    QuestAccept,
}

impl ServiceKind {
    pub fn required_tier(self) -> ReputationTier {
        match self {
            Self::BasicShop => ReputationTier::VeryHostile,
            Self::SpecialItems => ReputationTier::Friendly,
            Self::PremiumService => ReputationTier::VeryFriendly,
            Self::HeroOnly => ReputationTier::Heroic,
            Self::Information => ReputationTier::Neutral,
            Self::QuestAccept => ReputationTier::SlightlyHostile,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BasicShop => "basic shop",
            Self::SpecialItems => "special items",
            Self::PremiumService => "premium service",
            Self::HeroOnly => "hero-only service",
            Self::Information => "information gathering",
            Self::QuestAccept => "quest accept",
        }
    }
}

/// Access is denied only when the player's tier is strictly more hostile
/// than the most hostile tier the service accepts.
pub fn can_access_service(reputation: i32, service: ServiceKind) -> bool {
    ReputationTier::from_score(reputation).index() <= service.required_tier().index()
}

/// One-line status shown on reputation checks and in story context
pub fn status_message(reputation: i32) -> String {
    let tier = ReputationTier::from_score(reputation);
    format!("Reputation: {} ({})", reputation, tier.label())
}

/// Deeds with a fixed reputation weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReputationAction {
    QuestComplete,
    GoodDeed,
    SaveLife,
    SaveVillage,
    BossKill,
    BetrayCompanion,
    AttackCivilian,
    Theft,
    Lie,
    BreakPromise,
    Violence,
    DestroyVillage,
}

impl ReputationAction {
    const KEYWORDS: [(&'static str, ReputationAction); 12] = [
        ("quest complete", ReputationAction::QuestComplete),
        ("good deed", ReputationAction::GoodDeed),
        ("save life", ReputationAction::SaveLife),
        ("saved a life", ReputationAction::SaveLife),
        ("save village", ReputationAction::SaveVillage),
        ("saved the village", ReputationAction::SaveVillage),
        ("boss kill", ReputationAction::BossKill),
        ("betray", ReputationAction::BetrayCompanion),
        ("attack civilian", ReputationAction::AttackCivilian),
        ("theft", ReputationAction::Theft),
        ("broke a promise", ReputationAction::BreakPromise),
        ("destroy", ReputationAction::DestroyVillage),
    ];

    pub fn delta(self) -> i32 {
        match self {
            Self::QuestComplete => 10,
            Self::GoodDeed => 5,
            Self::SaveLife => 15,
            Self::SaveVillage => 25,
            Self::BossKill => 20,
            Self::BetrayCompanion => -30,
            Self::AttackCivilian => -40,
            Self::Theft => -15,
            Self::Lie => -5,
            Self::BreakPromise => -10,
            Self::Violence => -20,
            Self::DestroyVillage => -50,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::QuestComplete => "quest complete",
            Self::GoodDeed => "good deed",
            Self::SaveLife => "saved a life",
            Self::SaveVillage => "saved a village",
            Self::BossKill => "boss kill",
            Self::BetrayCompanion => "betrayed a companion",
            Self::AttackCivilian => "attacked a civilian",
            Self::Theft => "theft",
            Self::Lie => "lie",
            Self::BreakPromise => "broke a promise",
            Self::Violence => "violence",
            Self::DestroyVillage => "destroyed a village",
        }
    }

    /// Recognize a deed in free text such as an important-event summary
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, action)| *action)
    }
}

/// Moral weight the intent classifier attaches to a player action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReputationImpact {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl ReputationImpact {
    /// Anything other than "positive" or "negative" counts as neutral
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    /// Delta and log reason, or `None` when nothing should be recorded
    pub fn change(self) -> Option<(i32, &'static str)> {
        match self {
            Self::Positive => Some((2, "good deed")),
            Self::Negative => Some((-2, "suspicious act")),
            Self::Neutral => None,
        }
    }
}
