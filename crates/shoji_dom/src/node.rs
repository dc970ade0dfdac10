//! Node storage

use indexmap::IndexMap;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node in a [`Document`](crate::Document)
    pub struct NodeId;
}

/// Tag used for text nodes
pub const TEXT_TAG: &str = "#text";

/// Axis-aligned box in viewport coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Edge-inclusive point test
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }
}

/// Native `<dialog>` presentation state
#[derive(Debug, Clone, Default)]
pub(crate) struct DialogState {
    pub modal: bool,
    pub return_value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub tag: String,
    pub text: Option<String>,
    pub attrs: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    // Host-provided layout metrics
    pub scroll_height: f32,
    pub bounding_rect: Rect,

    pub dialog: DialogState,
}

impl NodeData {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            text: None,
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            scroll_height: 0.0,
            bounding_rect: Rect::default(),
            dialog: DialogState::default(),
        }
    }

    pub fn text(content: String) -> Self {
        Self {
            text: Some(content),
            ..Self::element(TEXT_TAG)
        }
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(10.0, 20.0));
        assert!(rect.contains(110.0, 70.0));
        assert!(!rect.contains(9.9, 30.0));
        assert!(!rect.contains(50.0, 70.5));
    }
}
