// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! ANSI SGR serialization (`to_ansi`) and the small parser that reverses it
//! (`from_ansi`), per §4.1.

use crate::ansi::color::{Color, ColorCapability, ForceColorMode, round_rgb_to_ansi256};
use crate::ansi::style::{Attr, StyleCode};
use crate::ansi::styled_text::builder::StyledTextBuilder;
use crate::ansi::styled_text::StyledText;

const ESC: char = '\u{1b}';

/// Box-drawing code points substituted under the alternate character set, in the order
/// the source terminfo `acsc` string lists them.
const BOX_DRAWING_CHARS: &str = "\u{2518}\u{2510}\u{250c}\u{2514}\u{253c}\u{2500}\u{251c}\u{2524}\u{2534}\u{252c}\u{2502}";
const BOX_DRAWING_ALT: &str = "jklmnqtuvwx";

fn alt_charset_letter(ch: char) -> Option<char> {
    BOX_DRAWING_CHARS
        .chars()
        .position(|c| c == ch)
        .map(|i| BOX_DRAWING_ALT.chars().nth(i).unwrap())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Fg,
    Bg,
}

fn color_sgr_params(
    slot: Slot,
    color: Color,
    colors: ColorCapability,
    force_mode: ForceColorMode,
) -> Vec<String> {
    match color {
        Color::Unset => vec![match slot {
            Slot::Fg => "39".to_string(),
            Slot::Bg => "49".to_string(),
        }],
        Color::Rgb(rgb) if colors.supports_true_color() => {
            let (r, g, b) = (rgb.red, rgb.green, rgb.blue);
            match slot {
                Slot::Fg => vec![format!("38;2;{r};{g};{b}")],
                Slot::Bg => vec![format!("48;2;{r};{g};{b}")],
            }
        }
        Color::Rgb(rgb) => {
            let idx = round_rgb_to_ansi256(rgb);
            color_sgr_params(slot, Color::Indexed(idx.index), colors, force_mode)
        }
        Color::Indexed(idx) => {
            if force_mode == ForceColorMode::ForceTrueColor && colors.supports_true_color() {
                let rgb = crate::ansi::color::AnsiValue::new(idx).as_rgb();
                return color_sgr_params(slot, Color::Rgb(rgb), colors, force_mode);
            }
            if force_mode == ForceColorMode::Force256 || idx >= 16 {
                return vec![match slot {
                    Slot::Fg => format!("38;5;{idx}"),
                    Slot::Bg => format!("48;5;{idx}"),
                }];
            }
            if idx >= 8 {
                let base = idx - 8;
                return vec![match slot {
                    Slot::Fg => format!("{}", 90 + base),
                    Slot::Bg => format!("{}", 100 + base),
                }];
            }
            vec![match slot {
                Slot::Fg => format!("{}", 30 + idx),
                Slot::Bg => format!("{}", 40 + idx),
            }]
        }
    }
}

fn effective(style: StyleCode, attr: Attr) -> bool { style.attr(attr) == Some(true) }

/// Whether `RLINE_DISABLE_ALTERNATE_CHARSET` asks the renderer to skip alt-charset
/// substitution regardless of what the caller passed for `alt_in`/`alt_out`.
fn alt_charset_disabled_by_env() -> bool {
    std::env::var("RLINE_DISABLE_ALTERNATE_CHARSET").is_ok_and(|v| v == "true" || v == "1")
}

/// Renders `text` as ANSI SGR bytes, emitting escapes only when the style actually
/// changes character-to-character. See §4.1 for the exact intra-group ordering, which is
/// observable and covered by the minimality/ordering tests below.
#[must_use]
pub fn to_ansi(
    text: &StyledText,
    colors: ColorCapability,
    force_mode: ForceColorMode,
    alt_in: Option<&str>,
    alt_out: Option<&str>,
) -> String {
    let disabled = alt_charset_disabled_by_env();
    let alt_in = alt_in.filter(|_| !disabled);
    let alt_out = alt_out.filter(|_| !disabled);

    let mut out = String::new();
    let mut last_style: Option<StyleCode> = None;
    let mut in_alt_charset = false;
    let use_alt_charset = alt_in.is_some() && alt_out.is_some();

    for sc in text.iter() {
        let style = sc.style;
        let changed = last_style != Some(style);
        if changed {
            if let Some(group) = build_change_group(last_style, style, colors, force_mode) {
                out.push(ESC);
                out.push('[');
                out.push_str(&group);
                out.push('m');
            }
            last_style = Some(style);
        }

        if use_alt_charset {
            if let Some(alt_ch) = alt_charset_letter(sc.ch) {
                if !in_alt_charset {
                    out.push_str(alt_in.unwrap());
                    in_alt_charset = true;
                }
                out.push(alt_ch);
                continue;
            } else if in_alt_charset {
                out.push_str(alt_out.unwrap());
                in_alt_charset = false;
            }
        }

        out.push(sc.ch);
    }

    if in_alt_charset {
        out.push_str(alt_out.unwrap());
    }

    if last_style.is_some_and(|s| s != StyleCode::default()) {
        out.push_str("\u{1b}[0m");
    }

    out
}

fn build_change_group(
    last: Option<StyleCode>,
    current: StyleCode,
    colors: ColorCapability,
    force_mode: ForceColorMode,
) -> Option<String> {
    let last = last.unwrap_or_default();
    let mut params: Vec<String> = Vec::new();

    for (attr, on_code, off_code) in [
        (Attr::Italic, "3", "23"),
        (Attr::Underline, "4", "24"),
        (Attr::Blink, "5", "25"),
        (Attr::Inverse, "7", "27"),
        (Attr::Conceal, "8", "28"),
        (Attr::CrossedOut, "9", "29"),
    ] {
        let was = effective(last, attr);
        let is = effective(current, attr);
        if was != is {
            params.push(if is { on_code.to_string() } else { off_code.to_string() });
        }
    }

    let fg_changed = last.fg != current.fg;
    if fg_changed {
        params.extend(color_sgr_params(Slot::Fg, current.fg, colors, force_mode));
    }
    let bg_changed = last.bg != current.bg;
    if bg_changed {
        params.extend(color_sgr_params(Slot::Bg, current.bg, colors, force_mode));
    }

    let bold_was = effective(last, Attr::Bold);
    let bold_is = effective(current, Attr::Bold);
    let faint_was = effective(last, Attr::Faint);
    let faint_is = effective(current, Attr::Faint);
    if bold_was != bold_is || faint_was != faint_is {
        if bold_is {
            params.push("1".to_string());
        }
        if faint_is {
            params.push("2".to_string());
        }
        if !bold_is && !faint_is {
            params.push("22".to_string());
        }
    } else if fg_changed && bold_is && !params.iter().any(|p| p == "1") {
        // Legacy terminals tie bold to the foreground color slot: re-assert it.
        params.push("1".to_string());
    }

    if params.is_empty() { None } else { Some(params.join(";")) }
}

/// Strips all ANSI CSI escape sequences (not only SGR) from `input`.
#[must_use]
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ESC && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Parses SGR escape sequences back into a styled sequence. Unknown SGR parameters are
/// ignored; a malformed/non-SGR CSI prefix (one that never terminates in `m`) is
/// re-inserted verbatim and normal appending resumes. Returns `None` only if `input` maps
/// to `None` (there is no content to parse).
#[must_use]
pub fn from_ansi(
    input: &str,
    tabs: Option<&[usize]>,
    alt_in: Option<&str>,
    alt_out: Option<&str>,
) -> Option<StyledText> {
    let mut builder = StyledTextBuilder::new();
    if let Some(tabs) = tabs {
        let _ = builder.set_tabs(tabs.to_vec());
    }

    let mut chars = input.chars().peekable();
    let mut in_alt_charset = false;

    while let Some(c) = chars.next() {
        if c == ESC && chars.peek() == Some(&'[') {
            let mut lookahead = chars.clone();
            lookahead.next(); // consume '['.
            let mut param_str = String::new();
            let mut terminator = None;
            for next in lookahead.by_ref() {
                if next == 'm' {
                    terminator = Some('m');
                    break;
                }
                if next.is_ascii_alphabetic() {
                    terminator = Some(next);
                    break;
                }
                param_str.push(next);
            }

            match terminator {
                Some('m') => {
                    chars = lookahead;
                    apply_sgr_params(&mut builder, &param_str);
                    continue;
                }
                Some(_) => {
                    // Recognized CSI, but not SGR: not part of this grammar. Re-insert
                    // verbatim and keep scanning from right after the escape char.
                    builder.append_plain("\u{1b}");
                    continue;
                }
                None => {
                    // Malformed: CSI never closes. Re-insert verbatim.
                    builder.append_plain("\u{1b}");
                    continue;
                }
            }
        }

        if let Some(marker) = alt_in {
            if !marker.is_empty() && matches_marker_from(c, &chars, marker) {
                in_alt_charset = true;
                advance_past(&mut chars, &marker[c.len_utf8()..]);
                continue;
            }
        }
        if let Some(marker) = alt_out {
            if !marker.is_empty() && matches_marker_from(c, &chars, marker) {
                in_alt_charset = false;
                advance_past(&mut chars, &marker[c.len_utf8()..]);
                continue;
            }
        }

        if in_alt_charset {
            if let Some(pos) = BOX_DRAWING_ALT.chars().position(|a| a == c) {
                builder.append_plain(&BOX_DRAWING_CHARS.chars().nth(pos).unwrap().to_string());
                continue;
            }
        }

        builder.append_plain(&c.to_string());
    }

    Some(builder.build())
}

/// Whether `marker` matches starting at the already-consumed character `first`,
/// continuing into `remaining` (which has not yet consumed anything beyond `first`).
fn matches_marker_from(
    first: char,
    remaining: &std::iter::Peekable<std::str::Chars<'_>>,
    marker: &str,
) -> bool {
    let mut marker_chars = marker.chars();
    if marker_chars.next() != Some(first) {
        return false;
    }
    remaining.clone().take(marker_chars.clone().count()).eq(marker_chars)
}

fn advance_past(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, rest: &str) {
    for _ in rest.chars() {
        chars.next();
    }
}

fn apply_sgr_params(builder: &mut StyledTextBuilder, param_str: &str) {
    let params: Vec<&str> = if param_str.is_empty() {
        vec!["0"]
    } else {
        param_str.split(';').collect()
    };

    let mut i = 0;
    while i < params.len() {
        let Ok(code) = params[i].parse::<u16>() else {
            i += 1;
            continue;
        };
        match code {
            0 => {
                builder.style(StyleCode::default());
            }
            1 => {
                builder.update_style(|s| s.set(Attr::Bold));
            }
            2 => {
                builder.update_style(|s| s.set(Attr::Faint));
            }
            3 => {
                builder.update_style(|s| s.set(Attr::Italic));
            }
            4 => {
                builder.update_style(|s| s.set(Attr::Underline));
            }
            5 => {
                builder.update_style(|s| s.set(Attr::Blink));
            }
            7 => {
                builder.update_style(|s| s.set(Attr::Inverse));
            }
            8 => {
                builder.update_style(|s| s.set(Attr::Conceal));
            }
            9 => {
                builder.update_style(|s| s.set(Attr::CrossedOut));
            }
            22 => {
                builder.update_style(|s| s.off(Attr::Bold).off(Attr::Faint));
            }
            23 => {
                builder.update_style(|s| s.off(Attr::Italic));
            }
            24 => {
                builder.update_style(|s| s.off(Attr::Underline));
            }
            25 => {
                builder.update_style(|s| s.off(Attr::Blink));
            }
            27 => {
                builder.update_style(|s| s.off(Attr::Inverse));
            }
            28 => {
                builder.update_style(|s| s.off(Attr::Conceal));
            }
            29 => {
                builder.update_style(|s| s.off(Attr::CrossedOut));
            }
            39 => {
                builder.update_style(|s| s.with_fg(Color::Unset));
            }
            49 => {
                builder.update_style(|s| s.with_bg(Color::Unset));
            }
            30..=37 => {
                builder.update_style(|s| s.with_fg(Color::Indexed((code - 30) as u8)));
            }
            40..=47 => {
                builder.update_style(|s| s.with_bg(Color::Indexed((code - 40) as u8)));
            }
            90..=97 => {
                builder.update_style(|s| s.with_fg(Color::Indexed((code - 90 + 8) as u8)));
            }
            100..=107 => {
                builder.update_style(|s| s.with_bg(Color::Indexed((code - 100 + 8) as u8)));
            }
            38 | 48 => {
                let slot_is_fg = code == 38;
                if params.get(i + 1) == Some(&"2") {
                    if let (Some(r), Some(g), Some(b)) =
                        (params.get(i + 2), params.get(i + 3), params.get(i + 4))
                    {
                        if let (Ok(r), Ok(g), Ok(b)) =
                            (r.parse::<u8>(), g.parse::<u8>(), b.parse::<u8>())
                        {
                            let rgb = crate::ansi::color::RgbValue::from_u8(r, g, b);
                            if slot_is_fg {
                                builder.update_style(|s| s.with_fg(Color::Rgb(rgb)));
                            } else {
                                builder.update_style(|s| s.with_bg(Color::Rgb(rgb)));
                            }
                            i += 4;
                        }
                    }
                } else if params.get(i + 1) == Some(&"5") {
                    if let Some(n) = params.get(i + 2).and_then(|p| p.parse::<u8>().ok()) {
                        if slot_is_fg {
                            builder.update_style(|s| s.with_fg(Color::Indexed(n)));
                        } else {
                            builder.update_style(|s| s.with_bg(Color::Indexed(n)));
                        }
                        i += 2;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::color::RgbValue;
    use pretty_assertions::assert_eq;

    fn styled(text: &str, f: impl Fn(StyleCode) -> StyleCode) -> StyledText {
        let mut b = StyledTextBuilder::new();
        b.update_style(f);
        b.append_plain(text);
        b.build()
    }

    #[test]
    fn test_end_to_end_bold_red_world() {
        let mut b = StyledTextBuilder::new();
        b.append_plain("Hello, ");
        b.update_style(|s| s.set(Attr::Bold).with_fg(Color::Indexed(1)));
        b.append_plain("world");
        let text = b.build();

        let ansi = to_ansi(&text, ColorCapability::INDEXED_256, ForceColorMode::None, None, None);
        assert_eq!(ansi, "Hello, \u{1b}[1;31mworld\u{1b}[0m");
    }

    #[test]
    fn test_from_ansi_indexed_color() {
        let text = from_ansi("\u{1b}[38;5;202mhi\u{1b}[0m", None, None, None).unwrap();
        assert_eq!(text.column_length(), 2);
        assert_eq!(text.style_at(0).unwrap().fg, Color::Indexed(202));
        assert_eq!(text.style_at(1).unwrap().fg, Color::Indexed(202));
        assert_eq!(text.style_at(0).unwrap().attr(Attr::Bold), None);
    }

    #[test]
    fn test_round_trip_true_color() {
        let text = styled("hi", |s| {
            s.set(Attr::Bold)
                .with_fg(Color::Rgb(RgbValue::from_u8(10, 20, 30)))
        });
        let ansi = to_ansi(&text, ColorCapability::TRUE_COLOR, ForceColorMode::None, None, None);
        let parsed = from_ansi(&ansi, None, None, None).unwrap();
        assert_eq!(parsed.len(), text.len());
        for i in 0..text.len() {
            assert_eq!(parsed.char_at(i), text.char_at(i));
            assert_eq!(parsed.style_at(i).unwrap().fg, text.style_at(i).unwrap().fg);
            assert_eq!(
                parsed.style_at(i).unwrap().attr(Attr::Bold),
                text.style_at(i).unwrap().attr(Attr::Bold)
            );
        }
    }

    #[test]
    fn test_sgr_minimality_no_redundant_params() {
        let mut b = StyledTextBuilder::new();
        b.update_style(|s| s.set(Attr::Bold));
        b.append_plain("aaa");
        let text = b.build();
        let ansi = to_ansi(&text, ColorCapability::INDEXED_256, ForceColorMode::None, None, None);
        // Only one SGR group should be emitted for three identically styled characters.
        assert_eq!(ansi.matches('\u{1b}').count(), 2); // one to set, one to reset.
    }

    #[test]
    fn test_malformed_csi_left_verbatim() {
        // Recognized CSI, non-SGR terminator (`z`, not `m`): the whole prefix is
        // re-inserted verbatim, per §4.1 "leave the prefix verbatim in output".
        let parsed = from_ansi("\u{1b}[999zplain", None, None, None).unwrap();
        let rendered: String = parsed.iter().map(|sc| sc.ch).collect();
        assert_eq!(rendered, "\u{1b}[999zplain");
    }

    #[test]
    fn test_strip_ansi_removes_all_csi() {
        assert_eq!(strip_ansi("\u{1b}[1;31mhi\u{1b}[0m"), "hi");
        assert_eq!(strip_ansi("\u{1b}[2Jclear"), "clear");
    }
}
