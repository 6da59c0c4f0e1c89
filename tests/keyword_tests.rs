// tests/keyword_tests.rs

use oasm::syntax::lexicon::{GP_REGISTERS, VECTOR_INSTRUCTIONS, VECTOR_REGISTERS};
use oasm::syntax::{lexicon, parse_rule};
use oasm::ErrorKind;

#[test]
fn every_reserved_word_is_refused_as_a_name() {
    for word in lexicon().reserved_words() {
        let error = parse_rule("name", word).expect_err(word);
        assert_eq!(
            error.kind,
            ErrorKind::ReservedWord { word: word.clone() },
            "{word}"
        );
    }
}

#[test]
fn reserved_words_reach_their_own_rules() {
    let lex = lexicon();
    let families = [
        ("opcode", lex.instructions()),
        ("ifKeyword", lex.if_keywords()),
        ("whileKeyword", lex.while_keywords()),
        ("forKeyword", lex.for_keywords()),
    ];
    for (rule, words) in families {
        for word in words {
            let node = parse_rule(rule, word)
                .unwrap_or_else(|e| panic!("{rule} {word}: {e}"))
                .unwrap();
            assert_eq!(node.flatten(), *word);
        }
    }
}

#[test]
fn registers_and_vector_mnemonics_are_not_reserved() {
    let words = GP_REGISTERS
        .iter()
        .chain(VECTOR_REGISTERS)
        .chain(VECTOR_INSTRUCTIONS)
        .chain(&["do", "else", "return", "static", "lock", "as", "break", "main"]);
    for word in words {
        let name = parse_rule("name", word)
            .unwrap_or_else(|e| panic!("{word}: {e}"))
            .unwrap();
        assert_eq!(name.flatten(), *word);
    }
}

#[test]
fn callf_and_rep_are_not_opcodes() {
    assert!(parse_rule("opcode", "callf").is_err());
    assert!(parse_rule("opcode", "rep").is_err());
    assert!(parse_rule("repPrefix", "repne").is_ok());
    assert!(parse_rule("name", "callf").is_ok());
}

#[test]
fn keywords_need_a_word_boundary() {
    // `format` starts with `for`, `movement` with `mov`, `bytes2` with `bytes`.
    for word in ["format", "movement", "bytes2", "r8dx"] {
        assert!(parse_rule("name", word).is_ok(), "{word}");
    }
    assert!(parse_rule("gpRegister", "r8d").is_ok());
    assert!(parse_rule("gpRegister", "r8dx").is_err());
}
