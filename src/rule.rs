use std::borrow::Cow;

/// A literal search/replace pair.
///
/// Matching is plain substring matching: every non-overlapping occurrence of
/// `search` is replaced left to right, and substituted text is never
/// re-scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRule {
    /// Text to look for
    pub search: &'static str,
    /// Text written in its place
    pub replacement: &'static str,
}

impl PatchRule {
    pub const fn new(search: &'static str, replacement: &'static str) -> Self {
        Self {
            search,
            replacement,
        }
    }

    /// Apply this rule to `content`.
    ///
    /// Borrows the input unchanged when `search` does not occur.
    pub fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
        if content.contains(self.search) {
            Cow::Owned(content.replace(self.search, self.replacement))
        } else {
            Cow::Borrowed(content)
        }
    }

    /// Whether `content` still contains the text this rule rewrites.
    pub fn is_pending(&self, content: &str) -> bool {
        content.contains(self.search)
    }

    /// Whether `content` contains the text this rule produces.
    pub fn is_applied(&self, content: &str) -> bool {
        content.contains(self.replacement)
    }
}

/// Renames the helper's private tick callback so it no longer collides with
/// LVGL's own `lv_tick_get_cb`. Order matters: the definition is renamed
/// first, then the registration call that references it.
pub const LV_TICK_RULES: [PatchRule; 2] = [
    PatchRule::new(
        "static uint32_t lv_tick_get_cb(",
        "static uint32_t my_lv_tick_get_cb(",
    ),
    PatchRule::new(
        "lv_tick_set_cb(lv_tick_get_cb);",
        "lv_tick_set_cb(my_lv_tick_get_cb);",
    ),
];

/// Apply `rules` in order, each one to the output of the previous.
pub fn apply_rules<'a>(rules: &[PatchRule], content: &'a str) -> Cow<'a, str> {
    rules
        .iter()
        .fold(Cow::Borrowed(content), |current, rule| match current {
            Cow::Borrowed(text) => rule.apply(text),
            Cow::Owned(text) => match rule.apply(&text) {
                Cow::Borrowed(_) => Cow::Owned(text),
                Cow::Owned(next) => Cow::Owned(next),
            },
        })
}

/// Patch state of a file's content with respect to a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    /// At least one rule would still change the content
    Unpatched,
    /// Nothing left to rewrite and at least one replacement is present
    Patched,
    /// Neither search nor replacement text occurs
    Unaffected,
}

impl RuleStatus {
    pub fn of(rules: &[PatchRule], content: &str) -> Self {
        if rules.iter().any(|rule| rule.is_pending(content)) {
            RuleStatus::Unpatched
        } else if rules.iter().any(|rule| rule.is_applied(content)) {
            RuleStatus::Patched
        } else {
            RuleStatus::Unaffected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HELPER_SNIPPET: &str =
        "static uint32_t lv_tick_get_cb(lv_disp_drv_t * drv) { ... } lv_tick_set_cb(lv_tick_get_cb);";

    #[test]
    fn test_rule_borrows_when_absent() {
        let rule = LV_TICK_RULES[0];
        let result = rule.apply("void setup() {}");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_rule_replaces_every_occurrence() {
        let rule = PatchRule::new("ab", "x");
        assert_eq!(rule.apply("ab-ab-abab"), "x-x-xx");
    }

    #[test]
    fn test_rule_does_not_rescan_replacement() {
        // The replacement contains the search text; a re-scan would loop.
        let rule = PatchRule::new("cb(", "my_cb(");
        assert_eq!(rule.apply("cb(cb("), "my_cb(my_cb(");
    }

    #[test]
    fn test_rule_is_literal_not_regex() {
        let rule = PatchRule::new("a.c(", "X(");
        assert_eq!(rule.apply("abc( a.c("), "abc( X(");
    }

    #[test]
    fn test_lv_tick_rules_on_helper_snippet() {
        let patched = apply_rules(&LV_TICK_RULES, HELPER_SNIPPET);
        assert_eq!(
            patched,
            "static uint32_t my_lv_tick_get_cb(lv_disp_drv_t * drv) { ... } lv_tick_set_cb(my_lv_tick_get_cb);"
        );
    }

    #[test]
    fn test_rules_apply_in_order() {
        // Second rule sees the output of the first.
        let rules = [PatchRule::new("a", "b"), PatchRule::new("b", "c")];
        assert_eq!(apply_rules(&rules, "a"), "c");
    }

    #[test]
    fn test_partial_match_only_first_rule() {
        let content = "static uint32_t lv_tick_get_cb(void);";
        let patched = apply_rules(&LV_TICK_RULES, content);
        assert_eq!(patched, "static uint32_t my_lv_tick_get_cb(void);");
    }

    #[test]
    fn test_apply_rules_keeps_owned_result_when_later_rule_misses() {
        let rules = [PatchRule::new("a", "b"), PatchRule::new("zzz", "y")];
        let result = apply_rules(&rules, "aaa");
        assert!(matches!(result, Cow::Owned(_)));
        assert_eq!(result, "bbb");
    }

    #[test]
    fn test_rule_status() {
        assert_eq!(
            RuleStatus::of(&LV_TICK_RULES, HELPER_SNIPPET),
            RuleStatus::Unpatched
        );
        let patched = apply_rules(&LV_TICK_RULES, HELPER_SNIPPET);
        assert_eq!(RuleStatus::of(&LV_TICK_RULES, &patched), RuleStatus::Patched);
        assert_eq!(
            RuleStatus::of(&LV_TICK_RULES, "int main() {}"),
            RuleStatus::Unaffected
        );
    }

    proptest! {
        #[test]
        fn prop_apply_is_idempotent(prefix in "[a-z \n]{0,40}", suffix in "[a-z \n]{0,40}") {
            let content = format!("{prefix}{HELPER_SNIPPET}{suffix}");
            let once = apply_rules(&LV_TICK_RULES, &content).into_owned();
            let twice = apply_rules(&LV_TICK_RULES, &once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_length_grows_by_rule_delta(prefix in "[a-z \n]{0,40}", suffix in "[a-z \n]{0,40}") {
            let content = format!("{prefix}{HELPER_SNIPPET}{suffix}");
            let patched = apply_rules(&LV_TICK_RULES, &content);
            let delta: usize = LV_TICK_RULES
                .iter()
                .map(|rule| rule.replacement.len() - rule.search.len())
                .sum();
            prop_assert_eq!(patched.len(), content.len() + delta);
            for rule in &LV_TICK_RULES {
                prop_assert!(!patched.contains(rule.search));
                prop_assert_eq!(patched.matches(rule.replacement).count(), 1);
            }
        }

        #[test]
        fn prop_unrelated_content_is_borrowed(content in "[a-z0-9 ;(){}\n]{0,200}") {
            prop_assume!(!content.contains("lv_tick"));
            let result = apply_rules(&LV_TICK_RULES, &content);
            prop_assert!(matches!(result, Cow::Borrowed(_)));
        }
    }
}
