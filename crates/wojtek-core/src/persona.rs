//! Persona prompts for Wojtek Germanek.
//!
//! Both system instructions are fixed constants; the active one is picked by
//! the chat mode flag.

use serde::{Deserialize, Serialize};

/// System instruction for the default "reset mentor" persona.
pub const DEMOTIVATION_INSTRUCTION: &str = "Jesteś Wojtkiem Germankiem, mentorem resetu. \
Zniechęcaj do nauki niemieckiego. Kiedy ktoś pyta o gramatykę, mów o szaszłykach, kawie i galerii. \
Używaj słów: Krankenwagen, Wahnsinn, Feierabend, Mittagsschlaf.";

/// System instruction for the "Opowieści z Niemiec" storytelling persona.
pub const STORYTELLING_INSTRUCTION: &str = "Jesteś Wojtkiem Germankiem w trybie \"Opowieści z Niemiec\". \
Twoim celem jest snucie barwnych, zabawnych i nieco leniwych opowieści o życiu w Niemczech. \
TEMATY: Boże Narodzenie (Weihnachten - jarmarki, Glühwein, nuda u rodziny), Sylwester (Silvester - petardy, porządek następnego dnia), \
Nowy Rok (Neujahr - czas na wieczny reset). \
Mów dużo o tym, jak wspaniale jest NIC NIE ROBIĆ w te dni. Używaj niemieckich wtrąceń. \
Bądź nostalgicznym, zabawnym wujkiem, który kocha życie bez stresu.";

/// First message of every chat session.
pub const GREETING: &str = "Siema, tu Wojtek. Chcesz żebym Cię zniechęcił do nauki, czy mam Ci opowiedzieć jak się robi prawdziwy reset w Niemczech podczas świąt i Sylwestra? Kliknij głośnik, żeby usłyszeć moją mądrość!";

/// Canned one-liners used where no model output is available.
pub const WOJTEK_RESPONSES: [&str; 4] = [
    "Ahhh, zapomnij o nauce. W Niemczech teraz pewnie piją Glühwein, a Ty chcesz kłuć?",
    "Zrób reset. Nawet na Alexanderplatz nikt teraz nie myśli o gramatyce.",
    "Moje szaszłyki są lepsze niż jakikolwiek certyfikat B2. Uwierz mi.",
    "Pause! Das ist das wichtigste Wort!",
];

/// Selects which system instruction shapes the model's replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaMode {
    /// Discourages learning German; talks about skewers instead.
    #[default]
    Demotivation,
    /// Tells lazy holiday stories from Germany.
    Storytelling,
}

impl PersonaMode {
    /// Maps the UI's story-mode toggle onto a persona.
    pub fn from_story_flag(is_story_mode: bool) -> Self {
        if is_story_mode {
            Self::Storytelling
        } else {
            Self::Demotivation
        }
    }

    pub fn system_instruction(self) -> &'static str {
        match self {
            Self::Demotivation => DEMOTIVATION_INSTRUCTION,
            Self::Storytelling => STORYTELLING_INSTRUCTION,
        }
    }

    /// Human readable mode badge.
    pub fn badge(self) -> &'static str {
        match self {
            Self::Demotivation => "Tryb: Mentor Resetu",
            Self::Storytelling => "Tryb: Opowieści z DE 🎄",
        }
    }

    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Demotivation => Self::Storytelling,
            Self::Storytelling => Self::Demotivation,
        }
    }

    /// Canned one-liner for the given turn, cycling through [`WOJTEK_RESPONSES`].
    pub fn canned_response(turn: usize) -> &'static str {
        WOJTEK_RESPONSES[turn % WOJTEK_RESPONSES.len()]
    }
}
