use serde::Serialize;

/// Save button state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
}

/// `idle -> saving -> (saved | idle)`, `saved -> idle` once acknowledged.
///
/// Every save gets a generation number; transitions carrying an older
/// generation are ignored so a late timer cannot reset a newer save.
#[derive(Debug, Default)]
pub struct SaveTracker {
    state: SaveState,
    generation: u64,
}

impl SaveTracker {
    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_saving(&self) -> bool {
        self.state == SaveState::Saving
    }

    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = SaveState::Saving;
        self.generation
    }

    pub fn complete(&mut self, generation: u64) {
        if generation == self.generation && self.state == SaveState::Saving {
            self.state = SaveState::Saved;
        }
    }

    pub fn fail(&mut self, generation: u64) {
        if generation == self.generation && self.state == SaveState::Saving {
            self.state = SaveState::Idle;
        }
    }

    pub fn acknowledge(&mut self, generation: u64) {
        if generation == self.generation && self.state == SaveState::Saved {
            self.state = SaveState::Idle;
        }
    }
}
