//! Generates C source code for a given program.
//!
//! The output is one self-contained translation unit that any C99 compiler accepts. Its
//! arithmetic is exactly the interpreter's: the cursor stops at the ends of the tape, accesses
//! off the tape read zero and write nothing, and a read at end of input leaves the cell alone.

use std::fmt::Write;

use crate::ir::{Instruction, Program};
use crate::tape::TAPE_LEN;

const PRELUDE: &str = "\
#include <stdio.h>
#include <stdint.h>

static uint8_t tape[TAPE_LEN];
static long p = 0;

static void move_by(long delta) {
    p += delta;
    if (p < 0) p = 0;
    if (p >= TAPE_LEN) p = TAPE_LEN - 1;
}

static uint8_t cell_get(long offset) {
    long i = p + offset;
    return (i >= 0 && i < TAPE_LEN) ? tape[i] : 0;
}

static void cell_set(long offset, uint8_t value) {
    long i = p + offset;
    if (i >= 0 && i < TAPE_LEN) tape[i] = value;
}

static void cell_add(long offset, uint8_t delta) {
    long i = p + offset;
    if (i >= 0 && i < TAPE_LEN) tape[i] = (uint8_t)(tape[i] + delta);
}

int main(void) {
    uint8_t counter = 0;
    (void)counter;
";

const EPILOGUE: &str = "\
    fflush(stdout);
    return 0;
}
";

/// Lowers a [Program] to C, one statement template per instruction.
pub struct CodeGenerator {
    c: String,
    depth: usize,
}

/// Generates a complete C program.
pub fn generate(program: &Program) -> String {
    CodeGenerator::new().compile(program)
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            c: String::new(),
            depth: 1,
        }
    }

    pub fn compile(mut self, program: &Program) -> String {
        let _ = writeln!(self.c, "#define TAPE_LEN {}", TAPE_LEN);
        self.c.push_str(PRELUDE);
        self.generate_body(program.instructions());
        self.c.push_str(EPILOGUE);
        self.c
    }

    fn generate_body(&mut self, body: &[Instruction]) {
        for instr in body {
            self.generate_instruction(instr);
        }
    }

    fn generate_instruction(&mut self, instr: &Instruction) {
        use Instruction::*;
        match instr {
            MoveBy(delta) => self.line(format!("move_by({});", delta)),
            AddBy { delta, offset } => {
                if *offset == 0 {
                    self.line(format!("tape[p] += {};", *delta as u8));
                } else {
                    self.line(format!("cell_add({}, {});", offset, *delta as u8));
                }
            }
            Print => self.line("putchar(tape[p]);"),
            Read => {
                self.open("{");
                self.line("fflush(stdout);");
                self.line("int c = getchar();");
                self.line("if (c != EOF) tape[p] = (uint8_t)c;");
                self.close();
            }
            Seek(step) => self.line(format!("while (tape[p]) move_by({});", step)),
            ClearCell => self.line("tape[p] = 0;"),
            TransferAdd(to) => {
                self.line(format!("cell_add({}, tape[p]);", to));
                self.line("tape[p] = 0;");
            }
            TransferSub(to) => {
                self.line(format!("cell_add({}, (uint8_t)-tape[p]);", to));
                self.line("tape[p] = 0;");
            }
            WeightedTransfer(entries) => {
                self.line("counter = tape[p];");
                for (offset, weight) in entries {
                    self.line(format!(
                        "cell_add({}, (uint8_t)(counter * {}));",
                        offset, *weight as u8
                    ));
                }
                self.line("tape[p] = 0;");
            }
            Multiply => {
                self.open("if (tape[p]) {");
                self.line("uint8_t a = tape[p], b = cell_get(1), r = cell_get(2), t = cell_get(3);");
                self.line("uint8_t m = (uint8_t)(b + t);");
                self.line("cell_set(1, m);");
                self.line("cell_set(2, (uint8_t)(r + b + (a - 1) * m));");
                self.line("cell_set(3, 0);");
                self.line("tape[p] = 0;");
                self.close();
            }
            Exponent => {
                self.open("if (tape[p]) {");
                self.line("uint8_t e = tape[p], base = cell_get(1), r = cell_get(2);");
                self.line("while (e--) r = (uint8_t)(r * base);");
                self.line("cell_set(2, r);");
                self.line("cell_set(3, 0);");
                self.line("cell_set(4, 0);");
                self.line("tape[p] = 0;");
                self.close();
            }
            Divide => {
                self.open("if (tape[p]) {");
                self.line("unsigned n = tape[p], d = cell_get(1) ? cell_get(1) : 256;");
                self.line("cell_set(1, (uint8_t)(d - n % d));");
                self.line("cell_set(2, (uint8_t)(n % d));");
                self.line("cell_set(3, (uint8_t)(n / d));");
                self.line("tape[p] = 0;");
                self.close();
            }
            Loop(body) => {
                self.open("while (tape[p]) {");
                self.generate_body(body);
                self.close();
            }
            Block(body) => {
                self.open("{");
                self.generate_body(body);
                self.close();
            }
        }
    }

    fn line(&mut self, statement: impl AsRef<str>) {
        let _ = writeln!(
            self.c,
            "{:width$}{}",
            "",
            statement.as_ref(),
            width = self.depth * 4
        );
    }

    fn open(&mut self, header: &str) {
        self.line(header);
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
        self.line("}");
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;

    fn c_for(source: &str) -> String {
        generate(&translate(source.as_bytes()).unwrap())
    }

    fn statements(c: &str) -> Vec<&str> {
        let body = c.split("(void)counter;\n").nth(1).unwrap();
        body.lines()
            .map(str::trim)
            .take_while(|line| *line != "fflush(stdout);")
            .collect()
    }

    #[test]
    fn complete_translation_unit() {
        let c = c_for("");

        assert!(c.starts_with("#define TAPE_LEN 30000\n#include <stdio.h>"));
        assert!(c.ends_with("return 0;\n}\n"));
        assert_eq!(c.matches('{').count(), c.matches('}').count());
    }

    #[test]
    fn runs_and_io() {
        assert_eq!(
            statements(&c_for("+++>-<<.")),
            vec![
                "tape[p] += 3;",
                "move_by(1);",
                "tape[p] += 255;",
                "move_by(-2);",
                "putchar(tape[p]);",
            ]
        );
    }

    #[test]
    fn clear_cell() {
        assert_eq!(statements(&c_for("[-]")), vec!["tape[p] = 0;"]);
    }

    #[test]
    fn weighted_transfer_uses_counter() {
        assert_eq!(
            statements(&c_for("[->+++>-<<]")),
            vec![
                "counter = tape[p];",
                "cell_add(1, (uint8_t)(counter * 3));",
                "cell_add(2, (uint8_t)(counter * 255));",
                "tape[p] = 0;",
            ]
        );
    }

    #[test]
    fn loops_are_indented_and_balanced() {
        let c = c_for("+[.>[.-]<-]");

        assert!(c.contains("    while (tape[p]) {\n        putchar(tape[p]);\n"));
        assert_eq!(c.matches('{').count(), c.matches('}').count());
    }

    #[test]
    fn seek() {
        assert_eq!(
            statements(&c_for("[<<]")),
            vec!["while (tape[p]) move_by(-2);"]
        );
    }
}
