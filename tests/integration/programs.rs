mod common;
use common::compile;

#[test]
fn full_program_end_to_end() {
    let out = compile(
        "class Car {
             int id;
             constructor() { id = 50; }
             public int getId() { return id; }
         }
         {
             Car c = new Car();
             print(c.getId());
         }",
    );
    assert_eq!(
        out,
        "var Car_getId = function(self) {\n\
         \treturn self.id;\n\
         };\n\
         var Car_vtable = [Car_getId];\n\
         var c = {\n\
         \tvtable: Car_vtable,\n\
         \tid: 50\n\
         };\n\
         console.log(c.vtable[0](c));\n"
    );
}

#[test]
fn inheritance_program_end_to_end() {
    let out = compile(
        "class ClassOne {
             int id;
             constructor() { id = 50; }
             public int getId() { return id; }
         }
         class Bran extends ClassOne {
             constructor() { super(); }
             public int getId() { return id + 1; }
         }
         {
             Bran b = new Bran();
             print(b.getId());
         }",
    );
    assert_eq!(
        out,
        "var ClassOne_getId = function(self) {\n\
         \treturn self.id;\n\
         };\n\
         var ClassOne_vtable = [ClassOne_getId];\n\
         var Bran_getId = function(self) {\n\
         \treturn self.id + 1;\n\
         };\n\
         var Bran_vtable = [Bran_getId];\n\
         var b = {\n\
         \tvtable: Bran_vtable,\n\
         \tid: 50\n\
         };\n\
         console.log(b.vtable[0](b));\n"
    );
}

#[test]
fn while_and_if_lower_structurally() {
    let out = compile(
        "class D { constructor() { } }
         {
             int x = 0;
             while (x < 10) {
                 x = x + 1;
                 if (x == 5) break; else print(x);
             }
         }",
    );
    assert!(out.contains("var x = 0;"));
    assert!(out.contains(
        "while (x < 10) {\n\tx = x + 1;\n\tif (x == 5) {\n\t\tbreak;\n\t} else {\n\t\tconsole.log(x);\n\t}\n}"
    ));
}

#[test]
fn arithmetic_keeps_explicit_grouping() {
    let out = compile(
        "class D { constructor() { } }
         {
             int a = (1 + 2) * 3;
             int b = 1 + 2 * 3;
             int c = 10 - (4 - 1);
         }",
    );
    assert!(out.contains("var a = (1 + 2) * 3;"));
    assert!(out.contains("var b = 1 + 2 * 3;"));
    assert!(out.contains("var c = 10 - (4 - 1);"));
}

#[test]
fn comments_are_ignored() {
    let out = compile(
        "// a vehicle
         class Car {
             constructor() { } // nothing to set up
         }
         // entry point
         print(1);",
    );
    assert!(out.contains("var Car_vtable = [];"));
    assert!(out.contains("console.log(1);"));
}

#[test]
fn generic_class_erases_to_one_definition() {
    let out = compile(
        "class Box<T> {
             T item;
             constructor(T t) { item = t; }
             public T get() { return item; }
         }
         {
             Box<int> a = new Box<int>(1);
             Box<boolean> b = new Box<boolean>(true);
             print(a.get());
         }",
    );
    assert_eq!(out.matches("var Box_get =").count(), 1);
    assert_eq!(out.matches("var Box_vtable =").count(), 1);
    assert!(out.contains("var a = {\n\tvtable: Box_vtable,\n\titem: 1\n};"));
    assert!(out.contains("var b = {\n\tvtable: Box_vtable,\n\titem: true\n};"));
    assert!(out.contains("console.log(a.vtable[0](a));"));
}

#[test]
fn generic_extends_erases_type_arguments() {
    let out = compile(
        "class Box<T> {
             T item;
             constructor(T t) { item = t; }
         }
         class IntBox extends Box<int> {
             constructor(int i) { super(i); }
         }
         IntBox b = new IntBox(3);",
    );
    assert!(out.contains("var b = {\n\tvtable: IntBox_vtable,\n\titem: 3\n};"));
}

#[test]
fn void_method_returns_nothing() {
    let out = compile(
        "class Logger {
             constructor() { }
             public void log(int level) {
                 print(level);
                 return;
             }
         }
         print(1);",
    );
    assert!(out.contains(
        "var Logger_log = function(level, self) {\n\tconsole.log(level);\n\treturn;\n};"
    ));
}

#[test]
fn two_instances_of_one_class() {
    let out = compile(
        "class P {
             int id;
             constructor(int i) { id = i; }
             public int getId() { return id; }
         }
         {
             P a = new P(1);
             P b = new P(2);
             print(a.getId());
             print(b.getId());
         }",
    );
    assert!(out.contains("var a = {\n\tvtable: P_vtable,\n\tid: 1\n};"));
    assert!(out.contains("var b = {\n\tvtable: P_vtable,\n\tid: 2\n};"));
    assert!(out.contains("console.log(a.vtable[0](a));"));
    assert!(out.contains("console.log(b.vtable[0](b));"));
}
