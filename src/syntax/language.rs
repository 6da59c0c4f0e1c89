//! The Organised Assembly rule network.
//!
//! Rule names are part of the output contract: downstream tools look nodes up
//! by these exact names. Alternatives are tried in the order written here.

use once_cell::sync::Lazy;

use crate::syntax::grammar::{
    choice, eof, lit, many, many1, not, opt, r, re, seq, words, Expr, Grammar, GrammarBuilder,
    GrammarError,
};
use crate::syntax::lexicon::{
    lexicon, CONTROL_REGISTERS, GP_REGISTERS, REP_PREFIXES, SEGMENT_REGISTERS, SIZE_KEYWORDS,
    STRING_SIZE_KEYWORDS, VECTOR_INSTRUCTIONS, VECTOR_REGISTERS,
};

pub const START_RULE: &str = "program";

static GRAMMAR: Lazy<Grammar> =
    Lazy::new(|| build_language().expect("the built-in grammar is well-formed"));

/// The process-wide language grammar, built on first use and never mutated.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// `first (sep first)*`
fn separated(first: Expr, separator: &str) -> Expr {
    seq([first.clone(), many(seq([lit(separator), first]))])
}

/// `[ name ]`, the bracketed declaration target.
fn bracketed_name() -> [Expr; 3] {
    [lit("["), r("name"), lit("]")]
}

pub fn build_language() -> Result<Grammar, GrammarError> {
    let lex = lexicon();
    let mut g = GrammarBuilder::new();

    // registers
    g.rule("gpRegister", words(GP_REGISTERS));
    g.rule("segRegister", words(SEGMENT_REGISTERS));
    g.rule("controlRegister", words(CONTROL_REGISTERS));
    g.rule(
        "register",
        choice([r("gpRegister"), r("segRegister"), r("controlRegister")]),
    );
    g.rule("sseRegister", words(VECTOR_REGISTERS));

    // numbers
    g.rule("decimal", re("[0-9]+d?"));
    g.rule(
        "hexadecimal",
        choice([re("0x[0-9a-fA-F]+"), re("[0-9][0-9a-fA-F]*h")]),
    );
    g.rule("binary", choice([re("0b[01]+"), re("[01]+b")]));
    g.rule("singleQuotedString", re(r"'([^'\\]|\\.)*'"));
    g.rule("doubleQuotedString", re(r#""([^"\\]|\\.)*""#));
    g.rule(
        "number",
        choice([
            r("hexadecimal"),
            r("binary"),
            r("decimal"),
            r("singleQuotedString"),
        ]),
    );

    // identifiers
    g.rule(
        "name",
        seq([
            not(words(lex.reserved_words())),
            re("[a-zA-Z_][a-zA-Z0-9_]*"),
        ]),
    );
    g.rule("namePath", separated(r("name"), "."));
    g.rule(
        "templateParameters",
        seq([lit("<"), separated(r("identifierPath"), ","), lit(">")]),
    );
    g.rule(
        "templateDeclarationParameters",
        seq([lit("<"), separated(r("name"), ","), lit(">")]),
    );
    g.rule(
        "templateName",
        seq([r("name"), opt(r("templateDeclarationParameters"))]),
    );
    g.rule("identifier", seq([r("name"), opt(r("templateParameters"))]));
    g.rule("identifierPath", separated(r("identifier"), "."));

    // expressions, flat and left to right
    g.rule(
        "sizeof",
        seq([lit("sizeof"), lit("("), r("identifierPath"), lit(")")]),
    );
    g.rule(
        "exprValue",
        choice([
            r("number"),
            r("register"),
            r("sizeof"),
            r("identifierPath"),
        ]),
    );
    g.rule(
        "binaryOperator",
        words(["+", "-", "*", "/", "^", "&", "|", "<<", ">>"]),
    );
    g.rule("unaryOperator", words(["-", "~"]));
    g.rule(
        "exprTerm",
        seq([
            opt(r("unaryOperator")),
            choice([seq([lit("("), r("expr"), lit(")")]), r("exprValue")]),
        ]),
    );
    g.rule(
        "expr",
        seq([r("exprTerm"), many(seq([r("binaryOperator"), r("exprTerm")]))]),
    );

    // operands
    g.rule("baseOrOffset", choice([r("gpRegister"), r("expr")]));
    g.rule(
        "offsetMultiplier",
        seq([r("baseOrOffset"), opt(seq([lit("*"), r("expr")]))]),
    );
    g.rule(
        "baseOffsetMultiplier",
        seq([
            r("baseOrOffset"),
            opt(seq([choice([lit("+"), lit("-")]), r("offsetMultiplier")])),
        ]),
    );
    g.rule("address", r("baseOffsetMultiplier"));
    g.rule(
        "segAddress",
        seq([opt(seq([r("segRegister"), lit(":")])), r("address")]),
    );
    g.rule("sizeSpecifier", words(SIZE_KEYWORDS));
    g.rule(
        "memReference",
        seq([opt(r("sizeSpecifier")), lit("["), r("segAddress"), lit("]")]),
    );
    g.rule("immediate", seq([opt(r("sizeSpecifier")), r("expr")]));
    g.rule(
        "operand",
        choice([
            r("register"),
            r("memReference"),
            r("aliasDecl"),
            r("immediate"),
        ]),
    );
    g.rule("operandList", separated(r("operand"), ","));

    // vector instructions
    g.rule(
        "sseMemReference",
        seq([lit("["), r("segAddress"), lit("]")]),
    );
    g.rule("sseOperand", choice([r("sseRegister"), r("sseMemReference")]));
    g.rule("sseOpcode", words(VECTOR_INSTRUCTIONS));
    g.rule(
        "sseInstruction",
        seq([r("sseOpcode"), separated(r("sseOperand"), ",")]),
    );

    // statements
    g.rule("opcode", words(lex.instructions()));
    g.rule("repPrefix", words(REP_PREFIXES));
    g.rule("lockPrefix", lit("lock"));
    g.rule(
        "instruction",
        seq([
            opt(r("lockPrefix")),
            opt(r("repPrefix")),
            r("opcode"),
            opt(r("operandList")),
        ]),
    );
    g.rule("label", seq([r("name"), lit(":")]));
    g.rule("comment", re("#.*"));
    g.rule(
        "statement",
        seq([
            opt(r("label")),
            opt(choice([
                r("instruction"),
                r("sseInstruction"),
                r("controlFlow"),
                r("abiReturn"),
                r("abiCall"),
                r("methodCall"),
                r("declaration"),
            ])),
            opt(r("comment")),
        ]),
    );
    g.rule("emptyStatement", opt(r("comment")));

    // variables and constants
    g.rule("sizeOrType", choice([r("sizeSpecifier"), r("identifierPath")]));
    g.rule("exprList", separated(r("expr"), ","));
    g.rule("varAssignment", seq([lit("="), r("expr")]));
    g.rule(
        "variableDecl",
        seq([r("sizeOrType")]
            .into_iter()
            .chain(bracketed_name())
            .chain([opt(r("varAssignment"))])),
    );
    g.rule("dataStringType", words(STRING_SIZE_KEYWORDS));
    g.rule(
        "dataStringDecl",
        seq([r("dataStringType")]
            .into_iter()
            .chain(bracketed_name())
            .chain([lit("="), r("exprList")])),
    );
    g.rule(
        "textStringDecl",
        seq([lit("string")]
            .into_iter()
            .chain(bracketed_name())
            .chain([lit("="), r("doubleQuotedString")])),
    );
    g.rule(
        "cStringDecl",
        seq([lit("cstring")]
            .into_iter()
            .chain(bracketed_name())
            .chain([lit("="), r("singleQuotedString")])),
    );
    g.rule(
        "fileDecl",
        seq([lit("binary")]
            .into_iter()
            .chain(bracketed_name())
            .chain([lit(":"), r("doubleQuotedString")])),
    );
    g.rule(
        "constantDecl",
        seq([lit("constant"), r("name"), lit("="), r("expr")]),
    );
    g.rule(
        "arrayDecl",
        seq([lit("byte"), lit("("), r("expr"), lit(")")]
            .into_iter()
            .chain(bracketed_name())),
    );
    g.rule(
        "aliasDecl",
        seq([lit("alias"), r("name"), lit("="), r("gpRegister")]),
    );
    g.rule(
        "declaration",
        choice([
            r("variableDecl"),
            r("dataStringDecl"),
            r("textStringDecl"),
            r("cStringDecl"),
            r("constantDecl"),
            r("arrayDecl"),
            r("aliasDecl"),
            r("fileDecl"),
        ]),
    );

    // enums
    g.rule("enumAssignment", seq([r("name"), lit("="), r("expr")]));
    g.rule(
        "enumStatement",
        seq([opt(r("enumAssignment")), opt(r("comment"))]),
    );
    g.rule(
        "enumBody",
        seq([lit("{"), separated(r("enumStatement"), "\n"), lit("}")]),
    );
    g.rule(
        "enum",
        seq([
            lit("enum"),
            r("name"),
            opt(r("emptySpace")),
            r("enumBody"),
            opt(r("comment")),
        ]),
    );

    // ABI calls
    g.rule(
        "memArgument",
        seq([opt(r("sizeOrType")), lit("["), r("segAddress"), lit("]")]),
    );
    g.rule("immArgument", seq([opt(r("sizeSpecifier")), r("expr")]));
    g.rule(
        "refArgument",
        seq([
            lit("ref"),
            choice([
                seq([lit("["), r("segAddress"), lit("]")]),
                r("singleQuotedString"),
                r("doubleQuotedString"),
            ]),
        ]),
    );
    g.rule(
        "argument",
        choice([
            r("gpRegister"),
            r("memArgument"),
            r("refArgument"),
            r("immArgument"),
        ]),
    );
    g.rule(
        "returnTarget",
        choice([
            r("gpRegister"),
            r("memArgument"),
            r("aliasDecl"),
            r("name"),
        ]),
    );
    g.rule("returnTargetList", separated(r("returnTarget"), ","));
    g.rule("argumentList", separated(r("argument"), ","));
    g.rule("abiAssignment", seq([r("returnTargetList"), lit("=")]));
    g.rule(
        "abiCall",
        seq([
            opt(r("abiAssignment")),
            r("identifierPath"),
            lit("("),
            opt(r("argumentList")),
            lit(")"),
        ]),
    );
    g.rule("abiReturn", seq([lit("return"), opt(r("argumentList"))]));

    // functions
    g.rule(
        "parameter",
        seq([r("sizeOrType")].into_iter().chain(bracketed_name())),
    );
    g.rule("parameterList", separated(r("parameter"), ","));
    g.rule(
        "functionDeclaration",
        seq([
            lit("function"),
            r("templateName"),
            lit("("),
            opt(r("parameterList")),
            lit(")"),
        ]),
    );
    g.rule(
        "emptySpace",
        many1(seq([r("emptyStatement"), lit("\n")])),
    );
    g.rule("localCode", separated(r("statement"), "\n"));
    g.rule("localBody", seq([lit("{"), r("localCode"), lit("}")]));
    g.rule(
        "function",
        seq([
            r("functionDeclaration"),
            opt(r("emptySpace")),
            r("localBody"),
            opt(r("comment")),
        ]),
    );

    // structs
    g.rule(
        "structVariableDecl",
        seq([r("sizeOrType")].into_iter().chain(bracketed_name())),
    );
    g.rule(
        "structField",
        choice([
            r("structVariableDecl"),
            r("constantDecl"),
            r("arrayDecl"),
        ]),
    );
    g.rule("staticKeyword", lit("static"));
    g.rule(
        "structMethodDecl",
        seq([
            opt(r("staticKeyword")),
            lit("method"),
            r("templateName"),
            lit("("),
            opt(r("parameterList")),
            lit(")"),
        ]),
    );
    g.rule(
        "structMethod",
        seq([
            r("structMethodDecl"),
            opt(r("emptySpace")),
            r("localBody"),
            opt(r("comment")),
        ]),
    );
    g.rule(
        "structStatement",
        seq([
            opt(choice([r("structField"), r("structMethod")])),
            opt(r("comment")),
        ]),
    );
    g.rule(
        "structBody",
        seq([lit("{"), separated(r("structStatement"), "\n"), lit("}")]),
    );
    g.rule(
        "struct",
        seq([
            lit("struct"),
            r("templateName"),
            opt(r("emptySpace")),
            r("structBody"),
            opt(r("comment")),
        ]),
    );
    g.rule(
        "regPointerCast",
        seq([
            lit("("),
            r("gpRegister"),
            lit("as"),
            r("identifierPath"),
            lit(")"),
        ]),
    );
    g.rule(
        "memPointerCast",
        seq([
            lit("["),
            r("segAddress"),
            lit("as"),
            r("identifierPath"),
            lit("]"),
        ]),
    );
    g.rule(
        "directPointer",
        seq([lit("["), r("identifierPath"), lit("]")]),
    );
    g.rule(
        "structReference",
        choice([
            r("directPointer"),
            r("regPointerCast"),
            r("memPointerCast"),
        ]),
    );
    g.rule(
        "methodCall",
        seq([
            opt(r("abiAssignment")),
            r("structReference"),
            lit("."),
            r("identifierPath"),
            lit("("),
            opt(r("argumentList")),
            lit(")"),
        ]),
    );

    // control flow
    g.rule(
        "oneliner",
        choice([
            r("instruction"),
            r("controlFlow"),
            r("abiReturn"),
            r("abiCall"),
        ]),
    );
    g.rule(
        "initialiser",
        choice([r("instruction"), r("abiCall"), r("declaration")]),
    );
    g.rule("condition", choice([r("instruction"), r("abiCall")]));
    g.rule(
        "repeatable",
        choice([r("instruction"), r("controlFlow"), r("abiCall")]),
    );
    g.rule("ifKeyword", words(lex.if_keywords()));
    g.rule("ifBody", choice([r("localBody"), r("oneliner")]));
    g.rule(
        "ifStatement",
        seq([
            r("ifKeyword"),
            lit("("),
            opt(r("condition")),
            lit(")"),
            opt(r("emptySpace")),
            r("ifBody"),
            opt(r("comment")),
            opt(seq([lit("\n"), r("elseStatement")])),
        ]),
    );
    g.rule(
        "elseStatement",
        seq([
            lit("else"),
            opt(r("emptySpace")),
            r("ifBody"),
            opt(r("comment")),
        ]),
    );
    g.rule("whileKeyword", words(lex.while_keywords()));
    g.rule("loopBody", choice([r("localBody"), r("repeatable")]));
    g.rule(
        "whileLoop",
        seq([
            r("whileKeyword"),
            lit("("),
            opt(r("condition")),
            lit(")"),
            opt(r("emptySpace")),
            r("loopBody"),
            opt(r("comment")),
        ]),
    );
    g.rule(
        "doWhileLoop",
        seq([
            lit("do"),
            opt(r("emptySpace")),
            r("loopBody"),
            opt(r("emptySpace")),
            r("whileKeyword"),
            lit("("),
            opt(r("condition")),
            lit(")"),
            opt(r("comment")),
        ]),
    );
    g.rule("forKeyword", words(lex.for_keywords()));
    g.rule(
        "forLoop",
        seq([
            r("forKeyword"),
            lit("("),
            opt(r("initialiser")),
            lit(";"),
            opt(r("condition")),
            lit(";"),
            opt(r("repeatable")),
            lit(")"),
            opt(r("emptySpace")),
            r("loopBody"),
            opt(r("comment")),
        ]),
    );
    g.rule(
        "doForLoop",
        seq([
            lit("do"),
            opt(r("emptySpace")),
            r("loopBody"),
            opt(r("emptySpace")),
            r("forKeyword"),
            lit("("),
            opt(r("initialiser")),
            lit(";"),
            opt(r("condition")),
            lit(";"),
            opt(r("repeatable")),
            lit(")"),
            opt(r("comment")),
        ]),
    );
    g.rule("breakStatement", lit("break"));
    g.rule("continueStatement", lit("continue"));
    g.rule(
        "controlFlow",
        choice([
            r("breakStatement"),
            r("continueStatement"),
            r("ifStatement"),
            r("whileLoop"),
            r("doWhileLoop"),
            r("forLoop"),
            r("doForLoop"),
        ]),
    );

    // namespaces
    g.rule(
        "globalStatement",
        choice([
            r("namespace"),
            r("enum"),
            r("struct"),
            r("function"),
            r("statement"),
            lit(""),
        ]),
    );
    g.rule("globalCode", separated(r("globalStatement"), "\n"));
    g.rule(
        "namespaceDeclaration",
        seq([lit("namespace"), r("namePath")]),
    );
    g.rule(
        "namespaceBody",
        seq([lit("{"), r("globalCode"), lit("}")]),
    );
    g.rule(
        "namespace",
        seq([
            r("namespaceDeclaration"),
            opt(r("emptySpace")),
            r("namespaceBody"),
            opt(r("comment")),
        ]),
    );

    // file structure
    g.rule(
        "using",
        seq([lit("using"), r("namePath"), opt(r("comment")), lit("\n")]),
    );
    g.rule(
        "usingList",
        seq([r("using"), many(seq([opt(r("emptySpace")), r("using")]))]),
    );
    g.rule("EOF", eof());
    g.rule(
        START_RULE,
        seq([
            opt(r("emptySpace")),
            opt(r("usingList")),
            r("globalCode"),
            r("EOF"),
        ]),
    );

    g.build(START_RULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_builds() {
        let grammar = build_language().unwrap();
        assert_eq!(grammar.id_of(START_RULE), Some(grammar.start()));
    }

    #[test]
    fn rule_names_follow_declaration_order() {
        let names: Vec<&str> = grammar().rule_names().collect();
        assert_eq!(names.first(), Some(&"gpRegister"));
        assert_eq!(names.last(), Some(&"program"));
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("number") < pos("expr"));
        assert!(pos("statement") < pos("controlFlow"));
    }
}
