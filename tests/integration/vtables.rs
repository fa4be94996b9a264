mod common;
use common::compile;

#[test]
fn base_class_vtable_in_declaration_order() {
    let out = compile(
        "class Shape {
             constructor() { }
             public int area() { return 0; }
             public int perimeter() { return 0; }
             public int sides() { return 0; }
         }
         print(1);",
    );
    assert!(out.contains("var Shape_vtable = [Shape_area, Shape_perimeter, Shape_sides];"));
}

#[test]
fn override_replaces_slot_without_growing_table() {
    let out = compile(
        "class ClassOne {
             constructor() { }
             public int getId() { return 1; }
         }
         class Bran extends ClassOne {
             constructor() { super(); }
             public int getId() { return 2; }
         }
         print(1);",
    );
    assert!(out.contains("var ClassOne_vtable = [ClassOne_getId];"));
    assert!(out.contains("var Bran_vtable = [Bran_getId];"));
}

#[test]
fn collision_with_different_signature_appends() {
    let out = compile(
        "class ClassOne {
             constructor() { }
             public void setId() { }
         }
         class Bran extends ClassOne {
             constructor() { super(); }
             public void setId(int i) { }
         }
         print(1);",
    );
    assert!(out.contains("var Bran_vtable = [ClassOne_setId, Bran_setId];"));
}

#[test]
fn four_generation_chain_matches_expected_slots() {
    let out = compile(
        "class One {
             constructor() { }
             public int getOne() { return 1; }
         }
         class Two extends One {
             constructor() { super(); }
             public int getOne() { return 21; }
             public int getTwo() { return 2; }
         }
         class Three extends Two {
             constructor() { super(); }
             public int getThree() { return 3; }
         }
         class Four extends Three {
             constructor() { super(); }
             public int getOne() { return 41; }
             public int getFour() { return 4; }
         }
         print(1);",
    );
    assert!(out.contains("var One_vtable = [One_getOne];"));
    assert!(out.contains("var Two_vtable = [Two_getOne, Two_getTwo];"));
    assert!(out.contains("var Three_vtable = [Two_getOne, Two_getTwo, Three_getThree];"));
    assert!(out.contains(
        "var Four_vtable = [Four_getOne, Two_getTwo, Three_getThree, Four_getFour];"
    ));
}

#[test]
fn declaration_order_does_not_matter_for_ancestors() {
    let out = compile(
        "class Rex extends Dog {
             constructor() { super(); }
         }
         class Dog extends Animal {
             constructor() { super(); }
         }
         class Animal {
             constructor() { }
             public int legs() { return 4; }
         }
         print(1);",
    );
    let animal = out.find("var Animal_vtable").unwrap();
    let dog = out.find("var Dog_vtable").unwrap();
    let rex = out.find("var Rex_vtable").unwrap();
    assert!(animal < dog && dog < rex);
}

#[test]
fn each_class_is_emitted_once() {
    // Two siblings share an ancestor; the ancestor must not be
    // recompiled when the second sibling pulls it in.
    let out = compile(
        "class Base {
             constructor() { }
             public int id() { return 0; }
         }
         class Left extends Base {
             constructor() { super(); }
         }
         class Right extends Base {
             constructor() { super(); }
         }
         print(1);",
    );
    assert_eq!(out.matches("var Base_vtable =").count(), 1);
    assert_eq!(out.matches("var Base_id =").count(), 1);
}

#[test]
fn private_methods_occupy_slots_too() {
    let out = compile(
        "class Secretive {
             constructor() { }
             private int hidden() { return 1; }
             public int visible() { return 2; }
         }
         print(1);",
    );
    assert!(out.contains("var Secretive_vtable = [Secretive_hidden, Secretive_visible];"));
}
