use std::{env, fs, process::ExitCode, time::Instant};

use rebol_core::{Cell, Interp, StepOutcome, Value, eval_to_end, natives};

mod reader;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "example.reb" };
    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut interp = Interp::new();
    natives::install(&mut interp);

    let start = Instant::now();
    let block = match reader::read_block(&mut interp, &code) {
        Ok(block) => block,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut out = Cell::unset();
    match eval_to_end(&mut interp, &mut out, &block) {
        Ok(StepOutcome::Thrown) => {
            let elapsed = start.elapsed();
            eprintln!("uncaught throw after {elapsed:?}: {}", out.value);
            ExitCode::FAILURE
        }
        Ok(StepOutcome::End | StepOutcome::Index(_)) => {
            let elapsed = start.elapsed();
            print_result(&out.value, elapsed);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let elapsed = start.elapsed();
            eprintln!("error after: {elapsed:?}\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn print_result(value: &Value, elapsed: std::time::Duration) {
    eprintln!("success after: {elapsed:?}\n{value}");
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
