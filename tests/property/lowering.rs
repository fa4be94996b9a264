// Property tests for the lowering invariants that hold for every
// program shape: slot order, offset stability under override,
// flattening order, and determinism of the emitted text.

use proptest::prelude::*;

// Strategy: a base class with `n` methods m0..m(n-1).
fn arb_base_class(n: usize) -> String {
    let methods: String = (0..n)
        .map(|i| format!("    public int m{i}() {{ return {i}; }}\n"))
        .collect();
    format!("class Base {{\n    constructor() {{ }}\n{methods}}}\nprint(1);")
}

// Strategy: an override chain of `depth` classes, each redefining getId.
fn arb_override_chain(depth: usize) -> String {
    let mut out = String::from(
        "class C0 {\n    constructor() { }\n    public int getId() { return 0; }\n}\n",
    );
    for i in 1..depth {
        out.push_str(&format!(
            "class C{i} extends C{} {{\n    constructor() {{ super(); }}\n    public int getId() {{ return {i}; }}\n}}\n",
            i - 1
        ));
    }
    out.push_str(&format!(
        "{{\n    C{last} v = new C{last}();\n    print(v.getId());\n}}",
        last = depth - 1
    ));
    out
}

// Strategy: a constructor chain of `depth` classes, one field per level.
fn arb_field_chain(depth: usize) -> String {
    let mut out = String::from(
        "class C0 {\n    int f0;\n    constructor() { f0 = 0; }\n}\n",
    );
    for i in 1..depth {
        out.push_str(&format!(
            "class C{i} extends C{} {{\n    int f{i};\n    constructor() {{ super(); f{i} = {i}; }}\n}}\n",
            i - 1
        ));
    }
    out.push_str(&format!("C{last} v = new C{last}();", last = depth - 1));
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn base_class_slots_follow_declaration_order(n in 1..8usize) {
        let source = arb_base_class(n);
        let out = opal::compile(&source).unwrap();

        let labels: Vec<String> = (0..n).map(|i| format!("Base_m{i}")).collect();
        let expected = format!("var Base_vtable = [{}];", labels.join(", "));
        prop_assert!(out.contains(&expected), "missing {expected} in:\n{out}");
    }

    #[test]
    fn override_chain_keeps_offset_zero(depth in 1..6usize) {
        let source = arb_override_chain(depth);
        let out = opal::compile(&source).unwrap();

        // Only the most derived implementation occupies the slot, and
        // every call still dispatches through offset 0.
        let last = depth - 1;
        let expected = format!("var C{last}_vtable = [C{last}_getId];");
        prop_assert!(out.contains(&expected), "missing {expected} in:\n{out}");
        prop_assert!(out.contains("v.vtable[0](v)"));
    }

    #[test]
    fn flattened_fields_appear_base_first(depth in 1..6usize) {
        let source = arb_field_chain(depth);
        let out = opal::compile(&source).unwrap();

        let fields: String = (0..depth)
            .map(|i| format!(",\n\tf{i}: {i}"))
            .collect();
        let last = depth - 1;
        let expected = format!("var v = {{\n\tvtable: C{last}_vtable{fields}\n}};");
        prop_assert!(out.contains(&expected), "missing literal in:\n{out}");
    }

    #[test]
    fn lowering_is_deterministic(n in 1..8usize, depth in 1..6usize) {
        for source in [arb_base_class(n), arb_override_chain(depth), arb_field_chain(depth)] {
            let first = opal::compile(&source).unwrap();
            let second = opal::compile(&source).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn every_offset_indexes_an_existing_slot(depth in 1..6usize) {
        // Emitted call sites never index past the receiver's vtable.
        let source = arb_override_chain(depth);
        let out = opal::compile(&source).unwrap();

        let last = depth - 1;
        let vtable_line = out
            .lines()
            .find(|l| l.starts_with(&format!("var C{last}_vtable")))
            .unwrap();
        let slot_count = vtable_line.matches("getId").count();

        for site in out.split("vtable[").skip(1) {
            if let Some(end) = site.find(']') {
                if let Ok(offset) = site[..end].parse::<usize>() {
                    prop_assert!(offset < slot_count.max(1));
                }
            }
        }
    }

    #[test]
    fn substituted_argument_reaches_the_literal(value in 0..1000i64) {
        let source = format!(
            "class One {{\n    int one;\n    constructor(int i) {{ one = i; }}\n}}\nOne o = new One({value});"
        );
        let out = opal::compile(&source).unwrap();
        let expected = format!("\tone: {value}\n}};");
        prop_assert!(out.contains(&expected), "missing {expected} in:\n{out}");
    }
}
