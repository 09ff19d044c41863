//! The UI-surface key vocabulary VS Code understands.
//!
//! Keys outside this list still load and render; the validator flags them so
//! typos like `editor.backgroud` get noticed. The list tracks the workbench
//! color reference and grows as VS Code does.

/// Every recognized UI-surface key, sorted for binary search.
pub const UI_KEYS: &[&str] = &[
    "activityBar.activeBackground",
    "activityBar.activeBorder",
    "activityBar.activeFocusBorder",
    "activityBar.background",
    "activityBar.border",
    "activityBar.dropBorder",
    "activityBar.foreground",
    "activityBar.inactiveForeground",
    "activityBarBadge.background",
    "activityBarBadge.foreground",
    "badge.background",
    "badge.foreground",
    "breadcrumb.activeSelectionForeground",
    "breadcrumb.background",
    "breadcrumb.focusForeground",
    "breadcrumb.foreground",
    "button.background",
    "button.border",
    "button.foreground",
    "button.hoverBackground",
    "button.secondaryBackground",
    "button.secondaryForeground",
    "button.secondaryHoverBackground",
    "button.separator",
    "checkbox.background",
    "checkbox.border",
    "checkbox.foreground",
    "contrastActiveBorder",
    "contrastBorder",
    "debugToolBar.background",
    "debugToolBar.border",
    "descriptionForeground",
    "diffEditor.insertedTextBackground",
    "diffEditor.removedTextBackground",
    "dropdown.background",
    "dropdown.border",
    "dropdown.foreground",
    "dropdown.listBackground",
    "editor.background",
    "editor.findMatchBackground",
    "editor.findMatchBorder",
    "editor.findMatchHighlightBackground",
    "editor.findRangeHighlightBackground",
    "editor.foldBackground",
    "editor.foreground",
    "editor.hoverHighlightBackground",
    "editor.inactiveSelectionBackground",
    "editor.lineHighlightBackground",
    "editor.lineHighlightBorder",
    "editor.rangeHighlightBackground",
    "editor.selectionBackground",
    "editor.selectionForeground",
    "editor.selectionHighlightBackground",
    "editor.wordHighlightBackground",
    "editor.wordHighlightStrongBackground",
    "editorBracketMatch.background",
    "editorBracketMatch.border",
    "editorCodeLens.foreground",
    "editorCursor.background",
    "editorCursor.foreground",
    "editorError.foreground",
    "editorGroup.border",
    "editorGroup.dropBackground",
    "editorGroupHeader.noTabsBackground",
    "editorGroupHeader.tabsBackground",
    "editorGroupHeader.tabsBorder",
    "editorGutter.addedBackground",
    "editorGutter.background",
    "editorGutter.deletedBackground",
    "editorGutter.modifiedBackground",
    "editorHint.foreground",
    "editorHoverWidget.background",
    "editorHoverWidget.border",
    "editorHoverWidget.foreground",
    "editorIndentGuide.activeBackground",
    "editorIndentGuide.background",
    "editorInfo.foreground",
    "editorInlayHint.background",
    "editorInlayHint.foreground",
    "editorLineNumber.activeForeground",
    "editorLineNumber.foreground",
    "editorLink.activeForeground",
    "editorOverviewRuler.border",
    "editorRuler.foreground",
    "editorSuggestWidget.background",
    "editorSuggestWidget.border",
    "editorSuggestWidget.foreground",
    "editorSuggestWidget.highlightForeground",
    "editorSuggestWidget.selectedBackground",
    "editorWarning.foreground",
    "editorWhitespace.foreground",
    "editorWidget.background",
    "editorWidget.border",
    "editorWidget.foreground",
    "errorForeground",
    "extensionBadge.remoteBackground",
    "extensionBadge.remoteForeground",
    "extensionButton.prominentBackground",
    "extensionButton.prominentForeground",
    "extensionButton.prominentHoverBackground",
    "focusBorder",
    "foreground",
    "gitDecoration.addedResourceForeground",
    "gitDecoration.conflictingResourceForeground",
    "gitDecoration.deletedResourceForeground",
    "gitDecoration.ignoredResourceForeground",
    "gitDecoration.modifiedResourceForeground",
    "gitDecoration.untrackedResourceForeground",
    "icon.foreground",
    "input.background",
    "input.border",
    "input.foreground",
    "input.placeholderForeground",
    "inputOption.activeBackground",
    "inputOption.activeBorder",
    "inputOption.activeForeground",
    "inputValidation.errorBackground",
    "inputValidation.errorBorder",
    "inputValidation.infoBackground",
    "inputValidation.infoBorder",
    "inputValidation.warningBackground",
    "inputValidation.warningBorder",
    "list.activeSelectionBackground",
    "list.activeSelectionForeground",
    "list.dropBackground",
    "list.errorForeground",
    "list.focusBackground",
    "list.focusForeground",
    "list.highlightForeground",
    "list.hoverBackground",
    "list.hoverForeground",
    "list.inactiveSelectionBackground",
    "list.inactiveSelectionForeground",
    "list.invalidItemForeground",
    "list.warningForeground",
    "menu.background",
    "menu.border",
    "menu.foreground",
    "menu.selectionBackground",
    "menu.selectionForeground",
    "menu.separatorBackground",
    "menubar.selectionBackground",
    "menubar.selectionForeground",
    "merge.currentHeaderBackground",
    "merge.incomingHeaderBackground",
    "minimap.background",
    "minimap.findMatchHighlight",
    "minimap.selectionHighlight",
    "notificationCenterHeader.background",
    "notifications.background",
    "notifications.border",
    "notifications.foreground",
    "panel.background",
    "panel.border",
    "panelTitle.activeBorder",
    "panelTitle.activeForeground",
    "panelTitle.inactiveForeground",
    "peekView.border",
    "peekViewEditor.background",
    "peekViewEditor.matchHighlightBackground",
    "peekViewResult.background",
    "peekViewResult.selectionBackground",
    "peekViewTitle.background",
    "progressBar.background",
    "quickInput.background",
    "quickInput.foreground",
    "quickInputList.focusBackground",
    "scrollbar.shadow",
    "scrollbarSlider.activeBackground",
    "scrollbarSlider.background",
    "scrollbarSlider.hoverBackground",
    "selection.background",
    "settings.headerForeground",
    "settings.modifiedItemIndicator",
    "sideBar.background",
    "sideBar.border",
    "sideBar.dropBackground",
    "sideBar.foreground",
    "sideBarSectionHeader.background",
    "sideBarSectionHeader.border",
    "sideBarSectionHeader.foreground",
    "sideBarTitle.foreground",
    "statusBar.background",
    "statusBar.border",
    "statusBar.debuggingBackground",
    "statusBar.debuggingForeground",
    "statusBar.foreground",
    "statusBar.noFolderBackground",
    "statusBar.noFolderForeground",
    "statusBarItem.activeBackground",
    "statusBarItem.hoverBackground",
    "statusBarItem.prominentBackground",
    "statusBarItem.remoteBackground",
    "statusBarItem.remoteForeground",
    "tab.activeBackground",
    "tab.activeBorder",
    "tab.activeBorderTop",
    "tab.activeForeground",
    "tab.border",
    "tab.hoverBackground",
    "tab.inactiveBackground",
    "tab.inactiveForeground",
    "tab.unfocusedActiveForeground",
    "tab.unfocusedInactiveForeground",
    "terminal.ansiBlack",
    "terminal.ansiBlue",
    "terminal.ansiBrightBlack",
    "terminal.ansiBrightBlue",
    "terminal.ansiBrightCyan",
    "terminal.ansiBrightGreen",
    "terminal.ansiBrightMagenta",
    "terminal.ansiBrightRed",
    "terminal.ansiBrightWhite",
    "terminal.ansiBrightYellow",
    "terminal.ansiCyan",
    "terminal.ansiGreen",
    "terminal.ansiMagenta",
    "terminal.ansiRed",
    "terminal.ansiWhite",
    "terminal.ansiYellow",
    "terminal.background",
    "terminal.border",
    "terminal.foreground",
    "terminal.selectionBackground",
    "terminalCursor.background",
    "terminalCursor.foreground",
    "textBlockQuote.background",
    "textBlockQuote.border",
    "textCodeBlock.background",
    "textLink.activeForeground",
    "textLink.foreground",
    "textPreformat.foreground",
    "textSeparator.foreground",
    "titleBar.activeBackground",
    "titleBar.activeForeground",
    "titleBar.border",
    "titleBar.inactiveBackground",
    "titleBar.inactiveForeground",
    "tree.indentGuidesStroke",
    "walkThrough.embeddedEditorBackground",
    "welcomePage.background",
    "widget.shadow",
];

/// Foreground/background pairs whose contrast decides readability, as
/// `(background, foreground)`.
pub const CONTRAST_PAIRS: &[(&str, &str)] = &[
    ("editor.background", "editor.foreground"),
    ("terminal.background", "terminal.foreground"),
    ("sideBar.background", "sideBar.foreground"),
    ("activityBar.background", "activityBar.foreground"),
    ("statusBar.background", "statusBar.foreground"),
    ("tab.activeBackground", "tab.activeForeground"),
    ("button.background", "button.foreground"),
    ("input.background", "input.foreground"),
    ("dropdown.background", "dropdown.foreground"),
    ("list.activeSelectionBackground", "list.activeSelectionForeground"),
    ("panel.background", "panelTitle.activeForeground"),
    ("titleBar.activeBackground", "titleBar.activeForeground"),
    ("badge.background", "badge.foreground"),
    ("quickInput.background", "quickInput.foreground"),
];

/// The keys every theme should set, with the color used when one is missing.
pub const CORE_KEYS: &[(&str, &str)] = &[
    ("editor.background", "#1e1e1e"),
    ("editor.foreground", "#d4d4d4"),
    ("activityBar.background", "#333333"),
    ("activityBar.foreground", "#ffffff"),
    ("sideBar.background", "#252526"),
    ("sideBar.foreground", "#cccccc"),
    ("statusBar.background", "#007acc"),
    ("statusBar.foreground", "#ffffff"),
];

/// Whether `key` is a recognized UI-surface key.
#[must_use]
pub fn is_known_key(key: &str) -> bool {
    UI_KEYS.binary_search(&key).is_ok()
}

/// Fallback color for `key`: its core default, else a neutral chosen from
/// whether the key names a background or a foreground.
#[must_use]
pub fn default_color(key: &str) -> &'static str {
    if let Some((_, color)) = CORE_KEYS.iter().find(|(k, _)| *k == key) {
        return color;
    }
    let lower = key.to_ascii_lowercase();
    if lower.contains("background") {
        "#1e1e1e"
    } else if lower.contains("foreground") {
        "#d4d4d4"
    } else {
        "#808080"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted_and_unique() {
        for pair in UI_KEYS.windows(2) {
            assert!(pair[0] < pair[1], "{} must sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn vocabulary_is_broad() {
        assert!(UI_KEYS.len() >= 200, "only {} keys", UI_KEYS.len());
    }

    #[test]
    fn pair_and_core_keys_are_known() {
        for (bg, fg) in CONTRAST_PAIRS {
            assert!(is_known_key(bg), "{bg}");
            assert!(is_known_key(fg), "{fg}");
        }
        for (key, _) in CORE_KEYS {
            assert!(is_known_key(key), "{key}");
        }
    }

    #[test]
    fn unknown_key_is_not_known() {
        assert!(!is_known_key("editor.backgroud"));
    }

    #[test]
    fn defaults_follow_key_role() {
        assert_eq!(default_color("statusBar.background"), "#007acc");
        assert_eq!(default_color("panel.background"), "#1e1e1e");
        assert_eq!(default_color("tab.activeForeground"), "#d4d4d4");
        assert_eq!(default_color("focusBorder"), "#808080");
    }
}
