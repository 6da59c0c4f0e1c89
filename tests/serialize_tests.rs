// tests/serialize_tests.rs

use oasm::syntax::{parse_str, to_json, write_json};

#[test]
fn single_instruction_program() {
    let tree = parse_str("ret").unwrap();
    let expected = concat!(
        r#"{"program":[{"globalCode":[{"globalStatement":[{"statement":"#,
        r#"[{"instruction":[{"opcode":["ret",1,1]},1,1]},1,1]},1,1]},1,1]},"#,
        r#"{"EOF":["",1,4]},1,1]}"#
    );
    assert_eq!(to_json(&tree), expected);
}

#[test]
fn comment_text_is_escaped() {
    let tree = parse_str("ret # say \"hi\"\tnow").unwrap();
    let json = to_json(&tree);
    assert!(json.contains(r##"{"comment":["# say \"hi\"\tnow",1,5]}"##), "{json}");
}

#[test]
fn newlines_are_anonymous_terminals() {
    let json = to_json(&parse_str("nop\nnop").unwrap());
    assert!(json.contains(r#"},"\n",{"globalStatement""#), "{json}");
    assert!(!json.contains('\n'));
}

#[test]
fn output_is_valid_json_with_integer_positions() {
    let source = "function f() {\n\tmov rax, [rbx + 8] # load\n}\n";
    let tree = parse_str(source).unwrap();
    let value: serde_json::Value = serde_json::from_str(&to_json(&tree)).unwrap();

    let entries = value["program"].as_array().unwrap();
    let [.., line, column] = entries.as_slice() else {
        panic!("program has no position");
    };
    assert_eq!((line.as_u64(), column.as_u64()), (Some(1), Some(1)));
    assert_eq!(value, serde_json::to_value(&tree).unwrap());
}

#[test]
fn rendering_twice_is_identical() {
    let tree = parse_str("constant size = 4\nbyte (size) [buffer]\n").unwrap();
    let mut streamed = String::new();
    write_json(&tree, &mut streamed).unwrap();
    assert_eq!(streamed, to_json(&tree));
    assert_eq!(to_json(&tree), to_json(&tree));
}
