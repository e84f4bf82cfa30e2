// Copyright (c) 2025 rline contributors. Licensed under Apache License, Version 2.0.

//! Status-area layout: packs description lines and option lists into a bounded number of
//! rows (§4.3 "Status layout").

use std::collections::BTreeMap;

use crate::ansi::{Attr, StyledText, StyledTextBuilder};

/// Renders a command's main description, column-packing it when it doesn't fit in
/// `height` rows, or when `last_arg_filter` forces a narrower view.
#[must_use]
pub fn render_main_description(
    main: &[StyledText],
    height: usize,
    last_arg_filter: Option<&str>,
) -> Vec<StyledText> {
    if height == 0 {
        return Vec::new();
    }
    if last_arg_filter.is_none() && main.len() <= height {
        return main.to_vec();
    }
    pack_columns(main, height)
}

/// Packs `lines` into `height` rows, wrapping overflow into additional tab-separated
/// columns. Every column is padded to its own widest entry's width so columns line up.
#[must_use]
pub fn pack_columns(lines: &[StyledText], height: usize) -> Vec<StyledText> {
    if lines.is_empty() || height == 0 {
        return Vec::new();
    }
    let columns: Vec<&[StyledText]> = lines.chunks(height).collect();
    let mut rows: Vec<StyledTextBuilder> = (0..height.min(lines.len())).map(|_| StyledTextBuilder::new()).collect();

    for (col_idx, column) in columns.iter().enumerate() {
        let width = column.iter().map(StyledText::column_length).max().unwrap_or(0);
        for (row_idx, entry) in column.iter().enumerate() {
            let builder = &mut rows[row_idx];
            if col_idx > 0 {
                builder.append_plain("\t");
            }
            let pad = width.saturating_sub(entry.column_length());
            builder.append_styled_text(entry);
            if pad > 0 {
                builder.append_plain(&" ".repeat(pad));
            }
        }
    }

    let mut result: Vec<StyledText> = rows.into_iter().map(|b| b.build()).collect();
    if result.len() > height {
        truncate_with_ellipsis(&mut result, height);
    }
    result
}

fn truncate_with_ellipsis(rows: &mut Vec<StyledText>, height: usize) {
    rows.truncate(height);
    if let Some(last) = rows.last_mut() {
        let mut b = StyledTextBuilder::new();
        b.append_styled_text(last);
        b.update_style(|s| s.set(Attr::Inverse));
        b.append_plain("...");
        *last = b.build();
    }
}

/// Renders the option entries whose pattern matches `opt` (§4.3 "Option description
/// pattern matching"), tiering the layout by how many entries match: a single match gets
/// its key as a header with tab-indented description lines; up to `height` matches get one
/// row each; up to `2 * height` matches get a two-column pack of just the keys; beyond
/// that, keys are tiled cyclically across `height` rows.
#[must_use]
pub fn render_option_filtered(options: &BTreeMap<String, Vec<StyledText>>, opt: &str, height: usize) -> Vec<StyledText> {
    let matches: Vec<(&str, &Vec<StyledText>)> = options
        .iter()
        .filter(|(key, _)| {
            key.split_whitespace()
                .any(|token| token.trim_end_matches(',').starts_with(opt))
        })
        .map(|(k, v)| (k.as_str(), v))
        .collect();

    if matches.is_empty() {
        return Vec::new();
    }

    if matches.len() == 1 {
        let (key, description) = matches[0];
        let mut result = Vec::with_capacity(description.len() + 1);
        let mut header = StyledTextBuilder::new();
        header.append_plain(key);
        result.push(header.build());
        for line in description {
            let mut row = StyledTextBuilder::new();
            row.append_plain("\t");
            row.append_styled_text(line);
            result.push(row.build());
        }
        return result;
    }

    if matches.len() <= height {
        return matches
            .iter()
            .map(|(key, _)| {
                let mut b = StyledTextBuilder::new();
                b.append_plain(key);
                b.build()
            })
            .collect();
    }

    let keys: Vec<StyledText> = matches
        .iter()
        .map(|(key, _)| {
            let mut b = StyledTextBuilder::new();
            b.append_plain(key);
            b.build()
        })
        .collect();

    if matches.len() <= 2 * height {
        return pack_columns(&keys, height);
    }

    // Beyond two columns' worth, tile cyclically: row i holds every key whose index is
    // congruent to i modulo height, each new column tab-separated.
    let mut rows: Vec<StyledTextBuilder> = (0..height).map(|_| StyledTextBuilder::new()).collect();
    for (i, key) in keys.iter().enumerate() {
        let row = &mut rows[i % height];
        if i >= height {
            row.append_plain("\t");
        }
        row.append_styled_text(key);
    }
    rows.into_iter().map(|b| b.build()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> StyledText {
        let mut b = StyledTextBuilder::new();
        b.append_plain(text);
        b.build()
    }

    #[test]
    fn test_render_main_description_returns_verbatim_when_it_fits() {
        let main = vec![line("one"), line("two")];
        let rendered = render_main_description(&main, 4, None);
        assert_eq!(rendered.len(), 2);
    }

    #[test]
    fn test_render_main_description_packs_when_height_exceeded() {
        let main: Vec<StyledText> = (0..6).map(|i| line(&format!("entry{i}"))).collect();
        let rendered = render_main_description(&main, 3, None);
        assert_eq!(rendered.len(), 3);
    }

    #[test]
    fn test_render_option_filtered_single_match_has_header_and_indented_body() {
        let mut options = BTreeMap::new();
        options.insert("-r, --recursive".to_string(), vec![line("recurse into directories")]);
        let rendered = render_option_filtered(&options, "-r", 4);
        assert_eq!(rendered.len(), 2);
    }

    #[test]
    fn test_render_option_filtered_multiple_matches_one_per_row() {
        let mut options = BTreeMap::new();
        options.insert("-a".to_string(), vec![line("a")]);
        options.insert("-b".to_string(), vec![line("b")]);
        let rendered = render_option_filtered(&options, "-", 4);
        assert_eq!(rendered.len(), 2);
    }
}
