use colored::Colorize;

use crate::{
    index::Index,
    middle::ir::{Instruction, Ir, VRegId, Value},
};

/// Render the IR in its plain text form, one instruction per line. Function
/// markers are flush left, everything else is indented under them. This is
/// the form snapshot tests compare against.
pub fn ir_to_string(ir: &Ir) -> String {
    let mut out = String::new();

    for instruction in &ir.instructions {
        if !matches!(instruction, Instruction::Function { .. }) {
            out.push_str("  ");
        }

        out.push_str(&instruction.to_string());
        out.push('\n');
    }

    out
}

/// Print the IR to stdout with terminal colors.
pub fn pretty_print_ir(ir: &Ir) {
    for instruction in &ir.instructions {
        match instruction {
            Instruction::Nop => println!("  {}", "NOP".cyan()),
            Instruction::Function {
                name,
                public,
                return_type,
            } => {
                if *public {
                    print!("{} ", "PUB".magenta());
                }

                println!(
                    "{} {} -> {}",
                    "FUNC".cyan(),
                    name.blue(),
                    return_type.to_string().magenta()
                );
            }
            Instruction::Return { value } => {
                println!("  {} {}", "RET".cyan(), colored_value(value))
            }
            Instruction::StoreInt64 { dest, value } => print_store(dest, "i64", value),
            Instruction::StoreFloat64 { dest, value } => print_store(dest, "f64", value),
            Instruction::StoreString { dest, value } => print_store(dest, "string", value),
            Instruction::StoreBool { dest, value } => print_store(dest, "bool", value),
        }
    }
}

fn print_store(dest: &VRegId, tag: &str, value: &Value) {
    println!(
        "  {} {} {} {}",
        dest.to_string().yellow(),
        tag.magenta(),
        "=".white(),
        colored_value(value)
    );
}

fn colored_value(value: &Value) -> String {
    match value {
        Value::Literal(text) => text.purple().to_string(),
        Value::VReg(id) => id.to_string().yellow().to_string(),
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Nop => write!(f, "NOP"),
            Instruction::Function {
                name,
                public,
                return_type,
            } => {
                if *public {
                    write!(f, "PUB ")?;
                }

                write!(f, "FUNC {name} -> {return_type}")
            }
            Instruction::Return { value } => write!(f, "RET {value}"),
            Instruction::StoreInt64 { dest, value } => write!(f, "{dest} i64 = {value}"),
            Instruction::StoreFloat64 { dest, value } => write!(f, "{dest} f64 = {value}"),
            Instruction::StoreString { dest, value } => write!(f, "{dest} string = {value}"),
            Instruction::StoreBool { dest, value } => write!(f, "{dest} bool = {value}"),
        }
    }
}

impl core::fmt::Display for VRegId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.index())
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Literal(text) => write!(f, "{text}"),
            Value::VReg(id) => write!(f, "{id}"),
        }
    }
}
