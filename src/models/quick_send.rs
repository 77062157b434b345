/// Number of quick-send rows in the window
pub const QUICK_SEND_SLOT_COUNT: usize = 20;

/// The fixed, ordered set of quick-send text fields.
///
/// Always holds exactly [`QUICK_SEND_SLOT_COUNT`] entries. Loading from a
/// shorter list leaves the remaining slots empty; a longer list is truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickSendSlots {
    slots: Vec<String>,
}

impl QuickSendSlots {
    /// All slots empty
    pub fn new() -> Self {
        Self {
            slots: vec![String::new(); QUICK_SEND_SLOT_COUNT],
        }
    }

    /// Fill slots in order from `entries`
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut slots = Self::new();
        for (slot, entry) in slots.slots.iter_mut().zip(entries) {
            *slot = entry;
        }
        slots
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }

    /// Replace the text of one slot.
    ///
    /// Returns `false` when `index` is out of range or the text is unchanged.
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        match self.slots.get_mut(index) {
            Some(slot) if *slot != text => {
                *slot = text;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(String::is_empty)
    }
}

impl Default for QuickSendSlots {
    fn default() -> Self {
        Self::new()
    }
}
