use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sloth::{lexer::Scanner, ExecutionContext, HostError, Program, SlothError, Value, Vm};

#[derive(Parser)]
#[command(author, version, about = "Sloth script interpreter")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script, optionally linking library scripts first
    Run {
        script: PathBuf,
        /// Library script whose functions become callable from the script
        #[arg(long = "lib")]
        libs: Vec<PathBuf>,
        /// Maximum script call depth
        #[arg(long)]
        max_call_depth: Option<usize>,
    },
    /// Evaluate a snippet of Sloth code
    Eval { source: String },
    /// Print the token stream of a script
    Tokens { script: PathBuf },
    /// Print the syntax tree of a script
    Ast { script: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SLOTH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let outcome = match args.command {
        Command::Run {
            script,
            libs,
            max_call_depth,
        } => run_script(script, libs, max_call_depth),
        Command::Eval { source } => eval_snippet(source),
        Command::Tokens { script } => print_tokens(script),
        Command::Ast { script } => print_ast(script),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_script(
    path: PathBuf,
    libs: Vec<PathBuf>,
    max_call_depth: Option<usize>,
) -> Result<(), SlothError> {
    let mut context = ExecutionContext::default();
    if let Some(depth) = max_call_depth {
        context.max_call_depth = depth;
    }
    let mut vm = Vm::with_context(context.clone());
    install_host_functions(&mut vm);
    for lib in libs {
        let mut library = Program::new(fs::read_to_string(&lib)?);
        library.compile()?;
        vm.link(&mut library)?;
    }

    let mut program = Program::new(fs::read_to_string(&path)?);
    program.compile()?;
    let value = program.run_with(Some(&vm), &context)?;
    println!("{value}");
    Ok(())
}

fn eval_snippet(source: String) -> Result<(), SlothError> {
    let mut vm = Vm::new();
    install_host_functions(&mut vm);
    let mut program = Program::new(source);
    program.compile()?;
    let value = program.run(Some(&vm))?;
    println!("{value}");
    Ok(())
}

fn print_tokens(path: PathBuf) -> Result<(), SlothError> {
    let source = fs::read_to_string(&path)?;
    let tokens = Scanner::new(&source).tokenize()?;
    for token in tokens {
        println!("{:>4} {token}", token.line);
    }
    Ok(())
}

fn print_ast(path: PathBuf) -> Result<(), SlothError> {
    let mut program = Program::new(fs::read_to_string(&path)?);
    program.compile()?;
    if let Some(ast) = program.ast() {
        println!("{ast}");
    }
    Ok(())
}

fn install_host_functions(vm: &mut Vm) {
    vm.register_host_function("print", |args| {
        let line: Vec<String> = args.iter().map(Value::to_string).collect();
        println!("{}", line.join(" "));
        Ok(Value::ZERO)
    });
    vm.register_host_function("len", |args| match args.first() {
        Some(Value::String(s)) => Ok(Value::int(i64::try_from(s.chars().count())?)),
        _ => Err("len expects a String argument".into()),
    });
    vm.register_host_function("min", |args| fold_ints(args, i64::min));
    vm.register_host_function("max", |args| fold_ints(args, i64::max));
}

fn fold_ints(args: &[Value], pick: fn(i64, i64) -> i64) -> Result<Value, HostError> {
    let mut acc: Option<i64> = None;
    for arg in args {
        let n = arg
            .as_int()
            .ok_or_else(|| format!("expected Int, found {}", arg.type_name()))?;
        acc = Some(acc.map_or(n, |current| pick(current, n)));
    }
    acc.map(Value::int)
        .ok_or_else(|| "expected at least one argument".into())
}
