use anyhow::Result;
use tracing::warn;

/// Item keys in assignment order. `g`, `j`, `k` and `q` are menu commands
/// and never name an item.
pub const KEY_ALPHABET: &str = "0123456789abcdefhilmnoprstuvwxyz";

pub fn key_capacity() -> usize {
    KEY_ALPHABET.len()
}

fn key_for_position(index: usize) -> Option<char> {
    KEY_ALPHABET.chars().nth(index)
}

fn position_for_key(key: char) -> Option<usize> {
    KEY_ALPHABET.chars().position(|candidate| candidate == key)
}

/// A front page row as produced by a [`ListingProvider`], before keys are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    /// `None` for self posts that only link back to their own thread.
    pub site_url: Option<String>,
    pub thread_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Site,
    Comments,
}

impl Selection {
    pub fn advance(self) -> Self {
        match self {
            Selection::Unselected => Selection::Site,
            Selection::Site => Selection::Comments,
            Selection::Comments => Selection::Unselected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    key: Option<char>,
    pub title: String,
    pub site_url: Option<String>,
    pub thread_url: String,
    pub selection: Selection,
}

impl Item {
    /// `None` when the listing outgrew the key alphabet; such items are shown
    /// but cannot be selected.
    pub fn key(&self) -> Option<char> {
        self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    items: Vec<Item>,
}

impl Listing {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let items: Vec<Item> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Item {
                key: key_for_position(index),
                title: entry.title,
                site_url: entry.site_url,
                thread_url: entry.thread_url,
                selection: Selection::Unselected,
            })
            .collect();

        let listing = Self { items };
        let unkeyed = listing.unkeyed();
        if unkeyed > 0 {
            warn!(
                unkeyed,
                capacity = key_capacity(),
                "listing exceeds key alphabet; extra items cannot be selected"
            );
        }
        listing
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: char) -> Option<&Item> {
        let index = position_for_key(key)?;
        self.items.get(index)
    }

    /// Advances the selection of the item bound to `key`, returning its new state.
    pub fn activate(&mut self, key: char) -> Option<Selection> {
        let index = position_for_key(key)?;
        let item = self.items.get_mut(index)?;
        item.selection = item.selection.advance();
        Some(item.selection)
    }

    pub fn count(&self, selection: Selection) -> usize {
        self.items
            .iter()
            .filter(|item| item.selection == selection)
            .count()
    }

    pub fn unkeyed(&self) -> usize {
        self.items.iter().filter(|item| item.key.is_none()).count()
    }
}

pub trait ListingProvider {
    fn front_page(&self) -> Result<Vec<Entry>>;
}

#[derive(Default)]
pub struct MockListingProvider;

impl ListingProvider for MockListingProvider {
    fn front_page(&self) -> Result<Vec<Entry>> {
        Ok(vec![
            Entry {
                title: "Show HN: A terminal front page reader".into(),
                site_url: Some("https://example.com/reader".into()),
                thread_url: "https://news.ycombinator.com/item?id=1".into(),
            },
            Entry {
                title: "Ask HN: What are you reading today?".into(),
                site_url: None,
                thread_url: "https://news.ycombinator.com/item?id=2".into(),
            },
        ])
    }
}

#[cfg(test)]
pub(crate) fn sample_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|index| Entry {
            title: format!("Story {index}"),
            site_url: Some(format!("https://example.com/{index}")),
            thread_url: format!("https://news.ycombinator.com/item?id={index}"),
        })
        .collect()
}
