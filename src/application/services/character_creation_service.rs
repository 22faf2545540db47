//! Character Creation Service - From a line of text to a persisted player
//!
//! Parsing happens locally so a session can always be started, narrator or
//! not. The narrator only contributes the starting location and backstory,
//! both of which have deterministic fallbacks.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::dto::{CharacterDraft, PreparedCharacter};
use crate::application::ports::outbound::{NarrationContext, NarrationKind, WorldStorePort};
use crate::application::services::{GameError, NarrationService};
use crate::domain::entities::{starting_kit, CharacterKind, NewCharacter};
use crate::domain::value_objects::game_constants::{STARTING_GOLD, STARTING_LEVEL, STARTING_REPUTATION};
use crate::domain::value_objects::{CharacterClass, CharacterId, Race, StartingStats};

pub const OPENING_OBJECTIVE: &str = "Begin a new adventure";

const NAME_MARKERS: [&[&str]; 4] = [&["name", "is"], &["named"], &["called"], &["i", "am"]];
const FILLER_WORDS: [&str; 6] = ["a", "an", "the", "my", "years", "old"];

pub fn creation_prompt() -> String {
    [
        "Create your character. Tell me a name, race, class and age, for example:",
        "  name: Aria, race: elf, class: mage, age: 25",
        "  My name is Aria, an elf mage, 25 years old",
        "Type 'help' for the list of races and classes.",
    ]
    .join("\n")
}

pub fn creation_help() -> String {
    let mut lines = vec!["Races:".to_string()];
    for race in Race::ALL {
        let (strength, agility, intelligence) = race.modifiers();
        lines.push(format!(
            "  - {}: {} (STR {:+}, AGI {:+}, INT {:+})",
            race.name(),
            race.description(),
            strength,
            agility,
            intelligence
        ));
    }
    lines.push("Classes:".to_string());
    for class in CharacterClass::ALL {
        lines.push(format!("  - {}: {}", class.name(), class.description()));
    }
    lines.push(creation_prompt());
    lines.join("\n")
}

fn structured_fields(input: &str) -> Vec<(String, String)> {
    input
        .split([',', ';', '\n'])
        .filter_map(|part| {
            let (key, value) = part.split_once(':').or_else(|| part.split_once('='))?;
            Some((key.trim().to_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn free_form_name(input: &str) -> Option<String> {
    let words: Vec<&str> = input
        .split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
        .filter(|w| !w.is_empty())
        .collect();
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();

    NAME_MARKERS.iter().find_map(|marker| {
        let at = lowered
            .windows(marker.len())
            .position(|window| window.iter().zip(marker.iter()).all(|(w, m)| w.as_str() == *m))?;
        let index = at + marker.len();
        let word = *words.get(index)?;
        let is_descriptor = FILLER_WORDS.contains(&lowered[index].as_str())
            || Race::find_in(word).is_some()
            || CharacterClass::find_in(word).is_some();
        (!is_descriptor).then(|| word.to_string())
    })
}

fn first_number(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find_map(|token| token.parse::<u32>().ok())
}

/// Parse creation input in either `key: value` or free-form style
pub fn parse_character_input(input: &str) -> Result<CharacterDraft, GameError> {
    let fields = structured_fields(input);
    let field = |names: &[&str]| {
        fields
            .iter()
            .find(|(key, _)| names.contains(&key.as_str()))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
    };

    let mut problems = Vec::new();

    let name = field(&["name"]).or_else(|| free_form_name(input));

    let race = match field(&["race"]) {
        Some(value) => Race::find_in(&value).or_else(|| {
            problems.push(format!(
                "unknown race '{}' (choose {})",
                value,
                Race::ALL.map(Race::name).join(", ")
            ));
            None
        }),
        None => Race::find_in(input),
    };

    let class = match field(&["class", "job"]) {
        Some(value) => CharacterClass::find_in(&value).or_else(|| {
            problems.push(format!(
                "unknown class '{}' (choose {})",
                value,
                CharacterClass::ALL.map(CharacterClass::name).join(", ")
            ));
            None
        }),
        None => CharacterClass::find_in(input),
    };

    let age = match field(&["age"]) {
        Some(value) => first_number(&value),
        None => first_number(input),
    }
    .filter(|age| (1..=1000).contains(age));

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if race.is_none() && problems.iter().all(|p| !p.starts_with("unknown race")) {
        missing.push("race");
    }
    if class.is_none() && problems.iter().all(|p| !p.starts_with("unknown class")) {
        missing.push("class");
    }
    if age.is_none() {
        missing.push("age");
    }
    if !missing.is_empty() {
        problems.insert(0, format!("missing {}", missing.join(", ")));
    }

    match (name, race, class, age) {
        (Some(name), Some(race), Some(class), Some(age)) if problems.is_empty() => Ok(CharacterDraft {
            name,
            race,
            class,
            age,
        }),
        _ => Err(GameError::Validation(format!(
            "Could not create the character: {}. Type 'help' for the format.",
            problems.join("; ")
        ))),
    }
}

pub fn character_sheet(prepared: &PreparedCharacter) -> String {
    let draft = &prepared.draft;
    let stats = &prepared.stats;
    format!(
        "{} - {} {}, age {}\nHP {} | MP {} | STR {} | AGI {} | INT {}\nStarting in {}.\n{}",
        draft.name,
        draft.race,
        draft.class,
        draft.age,
        stats.hp,
        stats.mp,
        stats.strength,
        stats.agility,
        stats.intelligence,
        prepared.starting_location,
        prepared.backstory
    )
}

/// Location names come back as prose sometimes; keep the first line, unquoted
fn clean_location(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim().trim_matches(|c| c == '"' || c == '\'' || c == '*'))
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub struct CharacterCreationService {
    store: Arc<dyn WorldStorePort>,
    narration: Arc<NarrationService>,
}

impl CharacterCreationService {
    pub fn new(store: Arc<dyn WorldStorePort>, narration: Arc<NarrationService>) -> Self {
        Self { store, narration }
    }

    /// Compute stats and ask the narrator for a starting location and backstory
    #[instrument(skip(self), fields(name = %draft.name))]
    pub async fn prepare(&self, draft: CharacterDraft) -> PreparedCharacter {
        let stats = StartingStats::compute(draft.class, draft.race);
        let facts = vec![
            format!("{} {}", draft.race, draft.class),
            format!("age {}", draft.age),
        ];

        let context = NarrationContext::new(&draft.name, "", STARTING_REPUTATION).with_facts(facts);
        let location = clean_location(&self.narration.narrate(NarrationKind::StartingLocation, &context).await);
        let starting_location = if location.is_empty() {
            super::narration_service::FALLBACK_STARTING_LOCATION.to_string()
        } else {
            location
        };

        let context = NarrationContext {
            location: starting_location.clone(),
            ..context
        };
        let backstory = self.narration.narrate(NarrationKind::Backstory, &context).await;

        PreparedCharacter {
            draft,
            stats,
            starting_location,
            backstory,
        }
    }

    /// Persist the player and hand out the class starting kit
    #[instrument(skip(self, prepared), fields(name = %prepared.draft.name))]
    pub async fn create_player(&self, prepared: &PreparedCharacter) -> Result<CharacterId, GameError> {
        let draft = &prepared.draft;
        let stats = &prepared.stats;

        let player_id = self
            .store
            .create_character(
                NewCharacter::new(&draft.name, CharacterKind::Player, draft.race.name(), draft.class.name())
                    .with_vitals(stats.hp, stats.mp)
                    .with_stats(stats.strength, stats.agility, stats.intelligence)
                    .with_level(STARTING_LEVEL)
                    .at(&prepared.starting_location)
                    .in_party()
                    .with_wealth(STARTING_REPUTATION, STARTING_GOLD)
                    .with_backstory(&prepared.backstory),
            )
            .await?;

        for item in starting_kit(draft.class) {
            self.store.add_item(player_id, item).await?;
        }

        info!(player_id = %player_id, "Player created");
        Ok(player_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::ports::outbound::{MockNarratorPort, NarratorError};
    use crate::infrastructure::persistence::SqliteWorldStore;

    #[test]
    fn test_parse_structured_input() {
        let draft = parse_character_input("name: Aria, race: elf, class: mage, age: 25").unwrap();
        assert_eq!(
            draft,
            CharacterDraft {
                name: "Aria".to_string(),
                race: Race::Elf,
                class: CharacterClass::Mage,
                age: 25,
            }
        );
    }

    #[test]
    fn test_parse_non_ascii_input() {
        let draft = parse_character_input("İ name is éric, elf mage, 20").unwrap();
        assert_eq!(draft.name, "éric");
        assert_eq!(draft.race, Race::Elf);
        assert_eq!(draft.class, CharacterClass::Mage);
        assert_eq!(draft.age, 20);

        let draft = parse_character_input("I am ÅSA, a human priest, 31").unwrap();
        assert_eq!(draft.name, "ÅSA");
    }

    #[test]
    fn test_parse_free_form_input() {
        let draft = parse_character_input("My name is Thorin, a dwarf warrior, 140 years old").unwrap();
        assert_eq!(draft.name, "Thorin");
        assert_eq!(draft.race, Race::Dwarf);
        assert_eq!(draft.class, CharacterClass::Warrior);
        assert_eq!(draft.age, 140);
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let err = parse_character_input("I am an elf").unwrap_err();
        match err {
            GameError::Validation(message) => {
                assert!(message.contains("missing name, class, age"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_race_is_reported() {
        let err = parse_character_input("name: Pip, race: gnome, class: rogue, age: 30").unwrap_err();
        assert!(matches!(&err, GameError::Validation(m) if m.contains("unknown race 'gnome'")));
    }

    #[test]
    fn test_help_lists_every_option() {
        let help = creation_help();
        for race in Race::ALL {
            assert!(help.contains(race.name()));
        }
        for class in CharacterClass::ALL {
            assert!(help.contains(class.name()));
        }
    }

    fn service(store: Arc<SqliteWorldStore>, narrator: MockNarratorPort) -> CharacterCreationService {
        CharacterCreationService::new(
            store,
            Arc::new(NarrationService::new(Arc::new(narrator), Duration::from_secs(1))),
        )
    }

    fn draft() -> CharacterDraft {
        CharacterDraft {
            name: "Aria".to_string(),
            race: Race::Elf,
            class: CharacterClass::Mage,
            age: 25,
        }
    }

    #[tokio::test]
    async fn test_prepare_falls_back_without_narrator() {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let mut narrator = MockNarratorPort::new();
        narrator
            .expect_narrate()
            .returning(|_, _| Err(NarratorError::Unavailable("offline".into())));

        let prepared = service(store, narrator).prepare(draft()).await;

        assert_eq!(prepared.starting_location, "Adventurer's Village");
        assert_eq!(prepared.backstory, "Aria is a elf mage setting out from Adventurer's Village.");
        assert_eq!(prepared.stats, StartingStats::compute(CharacterClass::Mage, Race::Elf));
    }

    #[tokio::test]
    async fn test_prepare_uses_narrated_location() {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let mut narrator = MockNarratorPort::new();
        narrator.expect_narrate().returning(|kind, context| match kind {
            NarrationKind::StartingLocation => Ok("\"Silverleaf Grove\"\nA quiet forest.".to_string()),
            _ => Ok(format!("{} grew up in {}.", context.player, context.location)),
        });

        let prepared = service(store, narrator).prepare(draft()).await;
        assert_eq!(prepared.starting_location, "Silverleaf Grove");
        assert_eq!(prepared.backstory, "Aria grew up in Silverleaf Grove.");
    }

    #[tokio::test]
    async fn test_create_player_persists_stats_and_kit() {
        let store = Arc::new(SqliteWorldStore::in_memory().await.unwrap());
        let service = service(store.clone(), MockNarratorPort::new());
        let prepared = PreparedCharacter {
            draft: draft(),
            stats: StartingStats::compute(CharacterClass::Mage, Race::Elf),
            starting_location: "Harbor Town".to_string(),
            backstory: "A scholar at heart.".to_string(),
        };

        let player_id = service.create_player(&prepared).await.unwrap();

        let player = store.get_character(player_id).await.unwrap();
        assert_eq!(player.kind, CharacterKind::Player);
        assert_eq!((player.max_hp, player.max_mp), (92, 106));
        assert_eq!((player.gold, player.reputation), (300, 0));
        assert!(player.is_in_party);

        let inventory = store.get_inventory(player_id).await.unwrap();
        assert_eq!(inventory.len(), 4);
        let mana = inventory.iter().find(|e| e.item_type == "mp_potion").unwrap();
        assert_eq!(mana.quantity, 5);
    }
}
