//! Scoped overlay styles.
//!
//! The overlay's shadow `<style>` is generated from a [`StyleSheet`] of
//! structured rules. Every declaration is emitted with `!important` so host
//! page styles can never override the overlay.

use std::fmt::Write;

use crate::geometry::{AnchoredPlacement, CenteredPlacement, Size};

const BORDER_WIDTH: &str = "4px";

/// Index of a rule in its sheet; stays valid after other rules are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
        }
    }

    pub fn host() -> Self {
        Self::new(":host")
    }

    pub fn decl(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.declarations.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<Option<Rule>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) -> RuleId {
        self.rules.push(Some(rule));
        RuleId(self.rules.len() - 1)
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            self.push(rule);
        }
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0).and_then(Option::as_ref)
    }

    pub fn set_property(&mut self, id: RuleId, name: &str, value: impl Into<String>) {
        if let Some(Some(rule)) = self.rules.get_mut(id.0) {
            rule.set(name, value);
        }
    }

    pub fn remove(&mut self, id: RuleId) {
        if let Some(slot) = self.rules.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Cascaded value of `name` for `selector`: the last rule wins.
    pub fn computed(&self, selector: &str, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .flatten()
            .filter(|rule| rule.selector == selector)
            .filter_map(|rule| rule.get(name))
            .last()
    }

    pub fn render(&self) -> String {
        let mut css = String::new();
        for rule in self.rules.iter().flatten() {
            let _ = write!(css, "{} {{", rule.selector);
            for (name, value) in &rule.declarations {
                let _ = write!(css, " {}: {} !important;", name, value);
            }
            css.push_str(" }\n");
        }
        css
    }
}

/// Base overlay look, surface sizing and the corner resizers.
pub fn main_rules() -> Vec<Rule> {
    let inset = format!("-{}", BORDER_WIDTH);
    vec![
        Rule::host()
            .decl("all", "initial")
            .decl("border", format!("{} solid #3338", BORDER_WIDTH))
            .decl("box-sizing", "content-box")
            .decl("background", "#000 center center no-repeat")
            .decl("z-index", "2147483647")
            .decl("cursor", "move")
            .decl("opacity", "0")
            .decl("transition", "opacity .25s"),
        Rule::new("iframe, video")
            .decl("width", "100%")
            .decl("height", "100%")
            .decl("border", "none")
            .decl("overflow", "hidden")
            .decl("background", "none")
            .decl("position", "relative")
            .decl("outline", "none"),
        Rule::new("#resizers")
            .decl("position", "absolute")
            .decl("pointer-events", "none")
            .decl("top", inset.clone())
            .decl("left", inset.clone())
            .decl("right", inset.clone())
            .decl("bottom", inset),
        Rule::new("#resizers.moving").decl("pointer-events", "auto"),
        Rule::new("#resizers *")
            .decl("position", "absolute")
            .decl("pointer-events", "auto")
            .decl("width", BORDER_WIDTH)
            .decl("height", BORDER_WIDTH),
        Rule::new(".top.left").decl("cursor", "nw-resize"),
        Rule::new(".top.right")
            .decl("right", "0")
            .decl("cursor", "ne-resize"),
        Rule::new(".bottom.right")
            .decl("right", "0")
            .decl("bottom", "0")
            .decl("cursor", "se-resize"),
        Rule::new(".bottom.left")
            .decl("bottom", "0")
            .decl("cursor", "sw-resize"),
    ]
}

/// Darkens the page around the overlay.
pub fn dark_rule() -> Rule {
    Rule::host()
        .decl("box-shadow", "0 0 0 90000px #000")
        .decl("border-color", "transparent")
}

pub fn error_rule() -> Rule {
    Rule::host().decl("background", "darkred")
}

pub fn fade_in_rule() -> Rule {
    Rule::host().decl("opacity", "1")
}

/// Drops the placeholder background once the surface has been up a while.
pub fn loaded_rule() -> Rule {
    Rule::host().decl("background-image", "none")
}

pub fn cursor_rule(cursor: &str) -> Rule {
    Rule::host().decl("cursor", cursor)
}

/// The full-viewport fence shown while dragging.
pub fn fence_rule(cursor: &str) -> Rule {
    Rule::host()
        .decl("all", "initial")
        .decl("position", "fixed")
        .decl("top", "0")
        .decl("left", "0")
        .decl("right", "0")
        .decl("bottom", "0")
        .decl("z-index", "2147483646")
        .decl("user-select", "none")
        .decl("-moz-user-select", "none")
        .decl("cursor", cursor)
}

pub fn anchored_rule(placement: &AnchoredPlacement) -> Rule {
    Rule::host()
        .decl("position", "absolute")
        .decl("left", px(placement.left))
        .decl("top", px(placement.top))
}

pub fn centered_rule(placement: &CenteredPlacement) -> Rule {
    Rule::host()
        .decl("position", "fixed")
        .decl("left", format!("calc(50% - {})", px(placement.left_offset)))
        .decl("top", format!("calc(50% - {})", px(placement.top_offset)))
}

pub fn size_rule(size: Size) -> Rule {
    Rule::host()
        .decl("width", px(size.width))
        .decl("height", px(size.height))
}

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({},{})", px(x), px(y))
}

pub fn px(value: f64) -> String {
    format!("{}px", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_important() {
        let mut sheet = StyleSheet::new();
        sheet.push(Rule::host().decl("opacity", "0").decl("cursor", "move"));
        assert_eq!(
            sheet.render(),
            ":host { opacity: 0 !important; cursor: move !important; }\n"
        );
    }

    #[test]
    fn test_later_rule_wins() {
        let mut sheet = StyleSheet::new();
        sheet.extend(main_rules());
        assert_eq!(sheet.computed(":host", "opacity"), Some("0"));

        sheet.push(fade_in_rule());
        assert_eq!(sheet.computed(":host", "opacity"), Some("1"));
    }

    #[test]
    fn test_removed_rule_keeps_other_ids() {
        let mut sheet = StyleSheet::new();
        let first = sheet.push(cursor_rule("move"));
        let second = sheet.push(size_rule(Size::for_width(500.0)));

        sheet.remove(first);
        assert!(sheet.rule(first).is_none());
        assert_eq!(sheet.rule(second).unwrap().get("height"), Some("281px"));
        assert_eq!(sheet.computed(":host", "cursor"), None);
    }

    #[test]
    fn test_set_property_updates_in_place() {
        let mut sheet = StyleSheet::new();
        let id = sheet.push(Rule::host());
        sheet.set_property(id, "transform", translate(10.0, -4.5));
        sheet.set_property(id, "transform", translate(12.0, 0.0));
        assert_eq!(
            sheet.rule(id).unwrap().declarations,
            vec![("transform".to_string(), "translate(12px,0px)".to_string())]
        );
    }

    #[test]
    fn test_centered_rule() {
        let rule = centered_rule(&CenteredPlacement {
            left_offset: 250.0,
            top_offset: 140.625,
        });
        assert_eq!(rule.get("position"), Some("fixed"));
        assert_eq!(rule.get("left"), Some("calc(50% - 250px)"));
        assert_eq!(rule.get("top"), Some("calc(50% - 140.625px)"));
    }

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(500.0), "500px");
        assert_eq!(px(281.25), "281.25px");
        assert_eq!(px(-3.0), "-3px");
    }
}
