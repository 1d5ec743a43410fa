/// Sequence length the emotion model was trained with.
pub const MAX_LEN: usize = 79;

/// Value appended to short sequences.
pub const PAD_VALUE: i64 = 0;

/// Brings a token sequence to exactly `max_len` entries.
///
/// Long sequences keep their first `max_len` tokens; short ones are padded
/// with zeros at the end. Both happen at the tail ("post"), matching how the
/// training data was prepared.
pub fn pad_sequence(tokens: &[i64], max_len: usize) -> Vec<i64> {
    let keep = tokens.len().min(max_len);
    let mut padded = Vec::with_capacity(max_len);
    padded.extend_from_slice(&tokens[..keep]);
    padded.resize(max_len, PAD_VALUE);
    padded
}
