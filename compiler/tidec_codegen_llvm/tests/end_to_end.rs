//! Source-to-IR tests: parse a small C-subset program and check the
//! emitted IR text contains the fragments that program must produce,
//! rather than matching the whole module verbatim.

use tidec_codegen_llvm::compile_translation_unit;
use tidec_log::error::ErrorSink;
use tidec_parser::parse_translation_unit;

fn compile(source: &str) -> String {
    let mut errors = ErrorSink::new();
    let tu = parse_translation_unit(source, &mut errors);
    assert_eq!(errors.error_get_count(), 0, "unexpected parse errors for: {source}");
    compile_translation_unit(&tu)
}

#[test]
fn scenario_a_function_with_two_params_and_add() {
    let ir = compile("int add(int a, int b) { return a + b; }");
    assert!(ir.contains("define i32 @add(i32 %p0, i32 %p1)"), "{ir}");
    assert!(ir.matches("alloca i32").count() >= 2, "{ir}");
    assert!(ir.contains("store i32 %p0"), "{ir}");
    assert!(ir.contains("store i32 %p1"), "{ir}");
    assert!(ir.contains("= add i32"), "{ir}");
    assert!(ir.contains("ret i32"), "{ir}");
}

#[test]
fn scenario_b_for_loop_has_expected_labels_and_no_unreachable() {
    let ir = compile(
        "int main(){ int s=0; for(int i=0;i<5;i=i+1){ s=s+i; } return s; }",
    );
    assert!(ir.contains("for_cond"), "{ir}");
    assert!(ir.contains("for_body"), "{ir}");
    assert!(ir.contains("for_incr"), "{ir}");
    assert!(ir.contains("for_end"), "{ir}");
    assert!(ir.contains("icmp slt i32"), "{ir}");
    assert!(ir.contains("br i1"), "{ir}");
    assert!(ir.contains("= load i32"), "{ir}");
    assert!(ir.contains("ret i32"), "{ir}");
    assert!(!ir.contains("unreachable"), "{ir}");
}

#[test]
fn scenario_c_cast_truncates_int_to_char() {
    let ir = compile("int main(){ int x = 65; char c = (char)x; return 0; }");
    assert!(ir.contains("trunc i32") && ir.contains("to i8"), "{ir}");
}

#[test]
fn scenario_d_printf_call_has_private_string_constant() {
    let ir = compile(r#"int main(){ printf("%d\n", 42); return 0; }"#);
    let has_private_string = ir
        .lines()
        .any(|l| l.contains("private") && l.contains("[") && l.contains("x i8]"));
    assert!(has_private_string, "{ir}");
    assert!(ir.contains(r"\0A\00"), "{ir}");
    assert!(
        ir.contains("call i32 (i8*, ...) @printf(i8* @.str0, i32 42)"),
        "{ir}"
    );
}

#[test]
fn scenario_e_struct_member_access_uses_getelementptr() {
    let ir = compile("struct P{ int x; int y; }; int f(struct P p){ return p.x + p.y; }");
    let struct_decl_pos = ir.find("%struct.P = type { i32, i32 }").expect("struct type emitted");
    let fn_pos = ir.find("@f").expect("function emitted");
    assert!(struct_decl_pos < fn_pos, "struct type must precede its first use: {ir}");
    assert!(
        ir.contains("getelementptr %struct.P, %struct.P*") || ir.contains("getelementptr inbounds %struct.P, %struct.P*"),
        "{ir}"
    );
    assert!(ir.contains("i32 0, i32 0"), "{ir}");
    assert!(ir.contains("i32 0, i32 1"), "{ir}");
}

#[test]
fn scenario_f_global_array_indexing() {
    let ir = compile("int a[3] = {10,20,30}; int main(){ return a[1]; }");
    assert!(ir.contains("@a = "), "{ir}");
    let has_array_initializer =
        ir.contains("zeroinitializer") || ir.contains("[3 x i32]") || ir.contains("[i32 10, i32 20, i32 30]");
    assert!(has_array_initializer, "{ir}");
    assert!(ir.contains("getelementptr"), "{ir}");
    assert!(ir.contains("i32 1"), "{ir}");
    assert!(ir.contains("= load i32") && ir.contains("ret i32"), "{ir}");
}
