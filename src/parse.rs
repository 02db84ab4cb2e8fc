//! Block parser: turns raw byte blocks into line positions.
//!
//! The parser is pure with respect to I/O. It consumes one block at a time
//! plus the scan cursor carried in [`IndexingState`], and emits the absolute
//! position of every line that *ends* inside the block. Lines freely span
//! blocks: the cursor keeps the current line's start position and the tab
//! columns accumulated so far, so a line split across any number of blocks
//! still gets one boundary and one width.
//!
//! # Encoding handling
//!
//! LF search matches on the single `0x0A` byte in every supported encoding;
//! for UTF-16/32 the match is adjusted back by `before_lf_offset` so the
//! boundary sits at the start of the LF code unit, and the cursor advances
//! by `line_feed_width` to skip the whole unit.
//!
//! # Tab expansion
//!
//! Each `\t` widens the line to the next multiple of [`TAB_STOP`] columns.
//! The extra columns (beyond the tab byte itself) accumulate in
//! `additional_spaces` and are folded into the line width when its LF is
//! found.

use memchr::memchr;

use crate::encoding::{EncodingParameters, TextCodec};
use crate::line_positions::BlockLinePositions;
use crate::types::{LineOffset, TAB_STOP};

/// Mutable cursor carried across blocks during a single scan.
///
/// Created at scan start, destroyed at scan end; never shared.
#[derive(Clone, Debug)]
pub struct IndexingState {
    /// Absolute position of the first byte of the in-progress line.
    pub pos: u64,
    /// Absolute position of the last LF code unit found.
    pub end: u64,
    /// File size snapshot taken when the scan started.
    pub file_size: u64,
    /// Widest line seen in the block being parsed (reset per block).
    pub max_length: u32,
    /// Tab-expansion columns accumulated for the in-progress line.
    pub additional_spaces: u32,
    /// Heuristic codec detected from the first block, if any.
    pub encoding_guess: Option<TextCodec>,
    /// Codec actually used for LF geometry, once resolved.
    pub file_codec: Option<TextCodec>,
    /// LF geometry derived from `file_codec`.
    pub encoding_params: EncodingParameters,
}

impl IndexingState {
    pub fn new(initial_position: u64, file_size: u64) -> Self {
        Self {
            pos: initial_position,
            end: 0,
            file_size,
            max_length: 0,
            additional_spaces: 0,
            encoding_guess: None,
            file_codec: None,
            encoding_params: EncodingParameters::default(),
        }
    }
}

/// Parses one block, returning the positions of all lines ending inside it.
///
/// `block_beginning` is the absolute offset of `block[0]`. On return,
/// `state.max_length` holds the widest line *completed* in this block (0 if
/// none), and `state.pos` points at the first byte of the next unfinished
/// line, which may lie beyond the block for a LF unit straddling the
/// boundary.
pub fn parse_data_block(
    block_beginning: u64,
    block: &[u8],
    state: &mut IndexingState,
) -> BlockLinePositions {
    state.max_length = 0;
    let mut line_positions = BlockLinePositions::new();

    let before_lf = u64::from(state.encoding_params.before_lf_offset);
    let lf_width = u64::from(state.encoding_params.line_feed_width);

    loop {
        // First byte of the in-progress line within this block; 0 when the
        // line started in an earlier block.
        let pos_within_block = state.pos.saturating_sub(block_beginning);
        if pos_within_block >= block.len() as u64 {
            break;
        }
        let search_start = pos_within_block as usize;
        let search = &block[search_start..];

        match memchr(b'\n', search) {
            Some(lf_rel) => {
                expand_tabs(&search[..lf_rel], block_beginning, search_start, state);

                let lf_byte = block_beginning + (search_start + lf_rel) as u64;
                state.end = lf_byte.saturating_sub(before_lf);

                let length = state
                    .end
                    .saturating_sub(state.pos)
                    .saturating_add(u64::from(state.additional_spaces));
                let length = length.min(u64::from(u32::MAX)) as u32;
                if length > state.max_length {
                    state.max_length = length;
                }

                state.pos = state.end + lf_width;
                state.additional_spaces = 0;
                line_positions.append(LineOffset(state.pos));
            }
            None => {
                expand_tabs(search, block_beginning, search_start, state);
                break;
            }
        }
    }

    line_positions
}

/// Accumulates tab-expansion columns for every `\t` in `line`.
///
/// `start_within_block` is the offset of `line[0]` within the block. The
/// column of each tab is measured from the line start (`state.pos`) with the
/// columns already accumulated, so consecutive tabs land on successive stops.
fn expand_tabs(line: &[u8], block_beginning: u64, start_within_block: usize, state: &mut IndexingState) {
    let before_lf = u64::from(state.encoding_params.before_lf_offset);

    let mut search_from = 0usize;
    while let Some(tab_rel) = memchr(b'\t', &line[search_from..]) {
        let tab_within_block = (start_within_block + search_from + tab_rel) as u64;
        // Report the tab at the start of its code unit, like LF.
        let tab_unit = (block_beginning + tab_within_block).saturating_sub(before_lf);
        let column = tab_unit
            .saturating_sub(state.pos)
            .saturating_add(u64::from(state.additional_spaces));

        state.additional_spaces += (TAB_STOP - column % TAB_STOP) as u32 - 1;
        search_from += tab_rel + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for(codec: TextCodec, file_size: u64) -> IndexingState {
        let mut state = IndexingState::new(0, file_size);
        state.file_codec = Some(codec);
        state.encoding_params = EncodingParameters::for_codec(codec);
        state
    }

    fn offsets(positions: &BlockLinePositions) -> Vec<u64> {
        positions.as_slice().iter().map(|p| p.0).collect()
    }

    #[test]
    fn three_terminated_lines() {
        let mut state = state_for(TextCodec::Utf8, 9);
        let positions = parse_data_block(0, b"ab\ncde\nf\n", &mut state);

        assert_eq!(offsets(&positions), [3, 7, 9]);
        assert_eq!(state.max_length, 3);
        assert_eq!(state.pos, 9);
    }

    #[test]
    fn unterminated_tail_leaves_cursor_in_place() {
        let mut state = state_for(TextCodec::Utf8, 6);
        let positions = parse_data_block(0, b"ab\ncde", &mut state);

        assert_eq!(offsets(&positions), [3]);
        assert_eq!(state.pos, 3);
        assert_eq!(state.max_length, 2);
    }

    #[test]
    fn line_spanning_blocks_gets_full_width() {
        let mut state = state_for(TextCodec::Utf8, 12);

        let first = parse_data_block(0, b"abcde", &mut state);
        assert!(first.is_empty());
        assert_eq!(state.pos, 0);

        let second = parse_data_block(5, b"fgh\nxy\n", &mut state);
        assert_eq!(offsets(&second), [9, 12]);
        // "abcdefgh" completed in this block: width 8.
        assert_eq!(state.max_length, 8);
    }

    #[test]
    fn tab_expands_to_next_stop() {
        let mut state = state_for(TextCodec::Utf8, 4);
        let positions = parse_data_block(0, b"a\tb\n", &mut state);

        assert_eq!(offsets(&positions), [4]);
        // 'a' + tab to column 8 + 'b'.
        assert_eq!(state.max_length, 9);
    }

    #[test]
    fn tab_at_stop_boundary_advances_a_full_stop() {
        // 8 chars, then a tab: the tab spans columns 8..16.
        let mut state = state_for(TextCodec::Utf8, 10);
        parse_data_block(0, b"12345678\t\n", &mut state);
        assert_eq!(state.max_length, 16);
    }

    #[test]
    fn consecutive_tabs_land_on_successive_stops() {
        let mut state = state_for(TextCodec::Utf8, 3);
        parse_data_block(0, b"\t\t\n", &mut state);
        assert_eq!(state.max_length, 16);
    }

    #[test]
    fn tab_columns_accumulate_across_blocks() {
        let mut state = state_for(TextCodec::Utf8, 6);

        parse_data_block(0, b"a\tb", &mut state);
        assert_eq!(state.additional_spaces, 6);

        let positions = parse_data_block(3, b"cd\n", &mut state);
        assert_eq!(offsets(&positions), [6]);
        // a -> col 1, tab -> col 8, bcd -> col 11.
        assert_eq!(state.max_length, 11);
        assert_eq!(state.additional_spaces, 0);
    }

    #[test]
    fn utf16le_boundaries_sit_on_code_units() {
        // "ab\ncd\n" UTF-16LE without BOM.
        let block: &[u8] = &[
            b'a', 0, b'b', 0, 0x0A, 0, b'c', 0, b'd', 0, 0x0A, 0,
        ];
        let mut state = state_for(TextCodec::Utf16Le, block.len() as u64);
        let positions = parse_data_block(0, block, &mut state);

        assert_eq!(offsets(&positions), [6, 12]);
        assert_eq!(state.max_length, 4);
    }

    #[test]
    fn utf16be_lf_reported_at_unit_start() {
        // "ab\ncd\n" UTF-16BE: LF is 00 0A, the 0A byte is second.
        let block: &[u8] = &[
            0, b'a', 0, b'b', 0, 0x0A, 0, b'c', 0, b'd', 0, 0x0A,
        ];
        let mut state = state_for(TextCodec::Utf16Be, block.len() as u64);
        let positions = parse_data_block(0, block, &mut state);

        assert_eq!(offsets(&positions), [6, 12]);
        assert_eq!(state.max_length, 4);
    }

    #[test]
    fn utf16le_lf_unit_split_across_blocks() {
        // LF low byte ends block 1; the 00 high byte starts block 2.
        let mut state = state_for(TextCodec::Utf16Le, 8);

        let first = parse_data_block(0, &[b'a', 0, 0x0A], &mut state);
        assert_eq!(offsets(&first), [4]);
        assert_eq!(state.pos, 4);

        let second = parse_data_block(3, &[0, b'b', 0, 0x0A, 0], &mut state);
        assert_eq!(offsets(&second), [8]);
    }

    #[test]
    fn utf16be_lf_unit_split_across_blocks() {
        // 00 ends block 1; 0A starts block 2. The boundary lands between
        // them and the next line starts one byte into block 2.
        let mut state = state_for(TextCodec::Utf16Be, 8);

        let first = parse_data_block(0, &[0, b'a', 0], &mut state);
        assert!(first.is_empty());

        let second = parse_data_block(3, &[0x0A, 0, b'b', 0, 0x0A], &mut state);
        assert_eq!(offsets(&second), [4, 8]);
    }

    #[test]
    fn utf32le_advances_four_bytes_per_lf() {
        // "a\nb\n" UTF-32LE.
        let block: &[u8] = &[
            b'a', 0, 0, 0, 0x0A, 0, 0, 0, b'b', 0, 0, 0, 0x0A, 0, 0, 0,
        ];
        let mut state = state_for(TextCodec::Utf32Le, block.len() as u64);
        let positions = parse_data_block(0, block, &mut state);

        assert_eq!(offsets(&positions), [8, 16]);
        assert_eq!(state.max_length, 4);
    }

    #[test]
    fn empty_lines_have_zero_width() {
        let mut state = state_for(TextCodec::Utf8, 3);
        let positions = parse_data_block(0, b"\n\n\n", &mut state);

        assert_eq!(offsets(&positions), [1, 2, 3]);
        assert_eq!(state.max_length, 0);
    }

    #[test]
    fn max_length_resets_per_block() {
        let mut state = state_for(TextCodec::Utf8, 10);
        parse_data_block(0, b"abcdef\n", &mut state);
        assert_eq!(state.max_length, 6);

        parse_data_block(7, b"xy\n", &mut state);
        assert_eq!(state.max_length, 2);
    }
}
