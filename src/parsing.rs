use indextree::{Arena, NodeEdge, NodeId};
use memchr::memchr2_iter;
use std::collections::HashMap;
use thiserror::Error;

pub type LabelId = i32;
pub type LabelDict = HashMap<String, (LabelId, usize)>;
pub type ParsedTree = Arena<LabelId>;

#[derive(Error, Debug)]
pub enum TreeParseError {
    #[error("tree string contains non ascii characters")]
    IsNotAscii,
    #[error("tree string has incorrect bracket notation format: {}", .0)]
    IncorrectFormat(String),
    #[error("bad tokenizing")]
    TokenizerError,
}

const TOKEN_START: u8 = b'{';
const TOKEN_END: u8 = b'}';
const ESCAPE_CHAR: u8 = b'\\';

#[inline(always)]
fn is_escaped(byte_string: &[u8], offset: usize) -> bool {
    offset > 0
        && byte_string[offset - 1] == ESCAPE_CHAR
        && !(offset > 1 && byte_string[offset - 2] == ESCAPE_CHAR)
}

fn braces_parity_check(parity: &mut i32, addorsub: i32) -> Result<(), TreeParseError> {
    *parity += addorsub;
    if *parity < 0 {
        return Err(TreeParseError::IncorrectFormat(
            "parity of braces does not match".to_owned(),
        ));
    }
    Ok(())
}

/// Tokenizes bracket notation into a flat stream of `{`, `}` and label tokens.
fn parse_tree_tokens(tree_str: &str) -> Result<Vec<String>, TreeParseError> {
    use TreeParseError as TPE;

    if !tree_str.is_ascii() {
        return Err(TPE::IsNotAscii);
    }
    let tree_bytes = tree_str.as_bytes();
    let token_positions: Vec<usize> = memchr2_iter(TOKEN_START, TOKEN_END, tree_bytes)
        .filter(|char_pos| !is_escaped(tree_bytes, *char_pos))
        .collect();

    if token_positions.len() < 2 {
        return Err(TPE::IncorrectFormat(
            "minimum of 2 brackets not found".to_owned(),
        ));
    }

    let mut str_tokens = vec![];
    let mut parity_check = 0;
    let mut token_iterator = token_positions.iter().peekable();

    while let Some(token_pos) = token_iterator.next() {
        match tree_bytes[*token_pos] {
            TOKEN_START => {
                braces_parity_check(&mut parity_check, 1)?;
                str_tokens.push("{".to_owned());
                let Some(token_end) = token_iterator.peek() else {
                    let err_msg = format!("label has no ending token near col {token_pos}");
                    return Err(TPE::IncorrectFormat(err_msg));
                };
                let label =
                    String::from_utf8_lossy(&tree_bytes[(token_pos + 1)..**token_end]).into_owned();
                str_tokens.push(label);
            }
            TOKEN_END => {
                braces_parity_check(&mut parity_check, -1)?;
                str_tokens.push("}".to_owned());
            }
            _ => return Err(TPE::TokenizerError),
        }
    }
    Ok(str_tokens)
}

fn intern(label: &str, ld: &mut LabelDict) -> LabelId {
    let next_id = ld.len() as LabelId;
    let entry = ld
        .entry(label.to_owned())
        .and_modify(|(_, count)| *count += 1)
        .or_insert((next_id, 1));
    entry.0
}

/// Parses a single bracket-notation tree, interning labels into `label_dict`
/// in preorder appearance order.
pub fn parse_tree(tree_str: &str, label_dict: &mut LabelDict) -> Result<ParsedTree, TreeParseError> {
    let tokens = parse_tree_tokens(tree_str)?;
    let mut tree_arena = ParsedTree::with_capacity(tokens.len() / 2);
    let mut node_stack: Vec<NodeId> = vec![];

    for t in tokens.iter().skip(1) {
        match t.as_str() {
            "{" => continue,
            "}" => {
                if node_stack.pop().is_none() {
                    return Err(TreeParseError::IncorrectFormat(
                        "wrong bracket pairing".to_owned(),
                    ));
                }
            }
            label_str => {
                let label = intern(label_str, label_dict);
                let n = tree_arena.new_node(label);
                if let Some(last_node) = node_stack.last() {
                    last_node.append(n, &mut tree_arena);
                } else if tree_arena.count() > 1 {
                    return Err(TreeParseError::IncorrectFormat(
                        "reached unexpected end of token".to_owned(),
                    ));
                }
                node_stack.push(n);
            }
        }
    }

    Ok(tree_arena)
}

/// Renders a parsed tree back to bracket notation, looking labels up by id.
pub fn tree_to_bracket(tree: &ParsedTree, label_dict: &LabelDict) -> String {
    let by_id: HashMap<LabelId, &str> = label_dict
        .iter()
        .map(|(label, (id, _))| (*id, label.as_str()))
        .collect();

    let mut bracket_notation = String::with_capacity(tree.count() * 4);
    let Some(root) = tree.iter().next() else {
        return bracket_notation;
    };
    let root_id = tree.get_node_id(root).expect("root id must resolve");

    for edge in root_id.traverse(tree) {
        match edge {
            NodeEdge::Start(node_id) => {
                bracket_notation.push('{');
                let label_id = tree.get(node_id).unwrap().get();
                bracket_notation.push_str(by_id.get(label_id).copied().unwrap_or(""));
            }
            NodeEdge::End(_) => bracket_notation.push('}'),
        }
    }
    bracket_notation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_into_tokens() {
        let tokens = parse_tree_tokens("{einsteinstrasse{1}{3}}");
        assert!(tokens.is_ok());
        assert_eq!(
            tokens.unwrap(),
            vec!["{", "einsteinstrasse", "{", "1", "}", "{", "3", "}", "}"]
        );
    }

    #[test]
    fn test_parses_escaped() {
        let input = r#"{article{key{An optimization of \log data}}}"#;
        let tokens = parse_tree_tokens(input).unwrap();
        assert_eq!(
            tokens,
            vec![
                "{",
                "article",
                "{",
                "key",
                "{",
                r"An optimization of \log data",
                "}",
                "}",
                "}"
            ]
        );
    }

    #[test]
    fn test_parses_into_tree_arena() {
        let mut ld = LabelDict::new();
        let tree = parse_tree("{a{b}{c}}", &mut ld).unwrap();
        assert_eq!(tree.count(), 3);
        assert_eq!(ld.len(), 3);
    }

    #[test]
    fn test_rejects_unbalanced_braces() {
        let mut ld = LabelDict::new();
        assert!(parse_tree("{a{b}", &mut ld).is_err());
    }

    #[test]
    fn test_round_trips_through_bracket_notation() {
        let mut ld = LabelDict::new();
        let input = "{a{b{d}}{c}}";
        let tree = parse_tree(input, &mut ld).unwrap();
        assert_eq!(tree_to_bracket(&tree, &ld), input);
    }

    #[test]
    fn test_shared_label_dict_reuses_ids() {
        let mut ld = LabelDict::new();
        let t1 = parse_tree("{a{b}}", &mut ld).unwrap();
        let t2 = parse_tree("{a{b}{c}}", &mut ld).unwrap();
        let a_id = ld["a"].0;
        let root1 = t1.iter().next().unwrap().get();
        let root2 = t2.iter().next().unwrap().get();
        assert_eq!(*root1, a_id);
        assert_eq!(*root2, a_id);
    }
}
