//! Bubble search with a wrap-around cursor.

use bubble_core::{BubbleId, SceneGraph};

/// Which text a query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Title,
    Body,
    #[default]
    Any,
}

impl SearchField {
    pub fn parse(s: &str) -> Self {
        match s {
            "name" => SearchField::Name,
            "title" => SearchField::Title,
            "body" => SearchField::Body,
            _ => SearchField::Any,
        }
    }
}

/// Bubbles matching `query` (case-insensitive substring), nearest to the
/// world origin first. A blank query matches nothing.
pub fn find_matches(graph: &SceneGraph, query: &str, field: SearchField) -> Vec<BubbleId> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let hit = |s: &str| s.to_lowercase().contains(&query);

    let mut matches: Vec<(f32, BubbleId)> = graph
        .iter()
        .filter(|(_, b)| {
            let (title, body) = b
                .content
                .as_ref()
                .map(|c| (c.title.as_str(), c.body.as_str()))
                .unwrap_or(("", ""));
            match field {
                SearchField::Name => hit(b.text()),
                SearchField::Title => hit(title),
                SearchField::Body => hit(body),
                SearchField::Any => hit(b.text()) || hit(title) || hit(body),
            }
        })
        .map(|(_, b)| (b.position.length(), b.id))
        .collect();
    matches.sort_by(|a, b| a.0.total_cmp(&b.0));
    matches.into_iter().map(|(_, id)| id).collect()
}

/// Current result list and cursor.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    matches: Vec<BubbleId>,
    cursor: usize,
}

impl SearchState {
    pub fn new(matches: Vec<BubbleId>) -> Self {
        Self { matches, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[BubbleId] {
        &self.matches
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<BubbleId> {
        self.matches.get(self.cursor).copied()
    }

    pub fn next(&mut self) -> Option<BubbleId> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.matches.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<BubbleId> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + self.matches.len() - 1) % self.matches.len();
        self.current()
    }

    /// Drop a bubble that no longer exists, keeping the cursor on the same
    /// match where possible.
    pub fn forget(&mut self, id: BubbleId) {
        if let Some(pos) = self.matches.iter().position(|m| *m == id) {
            self.matches.remove(pos);
            if pos < self.cursor || self.cursor >= self.matches.len() {
                self.cursor = self.cursor.saturating_sub(1);
            }
        }
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{Bubble, BubbleKind, Content, Vec2};
    use pretty_assertions::assert_eq;

    fn sample() -> SceneGraph {
        let mut sg = SceneGraph::new();
        sg.insert(Bubble::new(BubbleId(1), "Rust notes", BubbleKind::Root, Vec2::new(300.0, 0.0)))
            .unwrap();
        let mut b = Bubble::new(BubbleId(2), "Ideas", BubbleKind::Root, Vec2::new(10.0, 10.0));
        b.set_content(Some(Content {
            title: "rusty".into(),
            body: "nothing here".into(),
        }));
        sg.insert(b).unwrap();
        sg.insert(Bubble::new(BubbleId(3), "TRUST", BubbleKind::Root, Vec2::new(-50.0, 0.0)))
            .unwrap();
        sg
    }

    #[test]
    fn field_filters_and_distance_order() {
        let sg = sample();
        assert_eq!(find_matches(&sg, "rust", SearchField::Name), vec![BubbleId(3), BubbleId(1)]);
        assert_eq!(find_matches(&sg, " RUST ", SearchField::Title), vec![BubbleId(2)]);
        assert_eq!(
            find_matches(&sg, "rust", SearchField::Any),
            vec![BubbleId(2), BubbleId(3), BubbleId(1)]
        );
        assert!(find_matches(&sg, "here", SearchField::Name).is_empty());
        assert!(find_matches(&sg, "   ", SearchField::Any).is_empty());
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let mut s = SearchState::new(vec![BubbleId(1), BubbleId(2), BubbleId(3)]);
        assert_eq!(s.current(), Some(BubbleId(1)));
        assert_eq!(s.previous(), Some(BubbleId(3)));
        assert_eq!(s.next(), Some(BubbleId(1)));
        assert_eq!(s.next(), Some(BubbleId(2)));

        s.forget(BubbleId(1));
        assert_eq!(s.current(), Some(BubbleId(2)));
        s.forget(BubbleId(3));
        s.forget(BubbleId(2));
        assert_eq!(s.next(), None);
        assert!(s.is_empty());
    }
}
