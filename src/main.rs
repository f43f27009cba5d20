// ==========================================
// 表面处理危险品数据引擎 - 命令行入口
// ==========================================
// 职责: 解析子命令，调用 API 层，结果以 JSON 输出到 stdout
// 日志: 写入 stderr（RUST_LOG 控制级别）
// ==========================================

use hazard_finish_engine::db::get_default_db_path;
use hazard_finish_engine::{logging, ApiError, IngestApi, IngestStatus, QueryApi};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "\
用法: hazard-finish-engine [--db <路径>] <命令> [参数]

命令:
  ingest <源目录>        导入源文件并校验
  validate               校验当前库
  drift <源目录>         比对源文件摘要与上次导入记录
  show <代码>            输出表面处理代码的完整层级树
  specs <代码>           输出代码涉及的规范
  list-specs             输出全部规范及引用情况
  list-codes             输出全部表面处理代码
  chemicals <最低等级>   输出危险等级不低于指定值的化学品 (1-5)";

#[derive(Debug)]
enum CliError {
    Usage(String),
    Api(ApiError),
    Output(serde_json::Error),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CliError::Api(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String, CliError> {
    args.next()
        .ok_or_else(|| CliError::Usage(format!("缺少参数: {}", name)))
}

fn run(raw_args: Vec<String>) -> Result<ExitCode, CliError> {
    let mut args = raw_args.into_iter().peekable();

    let mut db_path = get_default_db_path();
    if args.peek().map(String::as_str) == Some("--db") {
        args.next();
        db_path = required_arg(&mut args, "--db <路径>")?;
    }

    let command = required_arg(&mut args, "命令")?;
    tracing::debug!(command = %command, db_path = %db_path, "执行命令");

    match command.as_str() {
        "ingest" => {
            let source_dir = PathBuf::from(required_arg(&mut args, "源目录")?);
            let report = IngestApi::new(db_path).ingest(&source_dir)?;
            print_json(&report)?;
            if report.status == IngestStatus::Failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        "validate" => print_json(&IngestApi::new(db_path).validate()?)?,
        "drift" => {
            let source_dir = PathBuf::from(required_arg(&mut args, "源目录")?);
            print_json(&IngestApi::new(db_path).detect_drift(&source_dir)?)?;
        }
        "show" => {
            let code = required_arg(&mut args, "代码")?;
            print_json(&QueryApi::new(db_path).get_finish_code_tree(&code)?)?;
        }
        "specs" => {
            let code = required_arg(&mut args, "代码")?;
            print_json(&QueryApi::new(db_path).get_finish_code_specs(&code)?)?;
        }
        "list-specs" => print_json(&QueryApi::new(db_path).get_all_specifications()?)?,
        "list-codes" => print_json(&QueryApi::new(db_path).list_finish_codes()?)?,
        "chemicals" => {
            let raw = required_arg(&mut args, "最低等级")?;
            let min_level: i64 = raw
                .trim()
                .parse()
                .map_err(|_| CliError::Usage(format!("危险等级必须为整数: {}", raw)))?;
            print_json(&QueryApi::new(db_path).get_chemicals_by_hazard_level(min_level)?)?;
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => return Err(CliError::Usage(format!("未知命令: {}", other))),
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    logging::init();

    match run(std::env::args().skip(1).collect()) {
        Ok(code) => code,
        Err(CliError::Usage(msg)) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            ExitCode::from(2)
        }
        Err(CliError::Api(err)) => {
            tracing::error!(error = %err, "命令执行失败");
            eprintln!("错误: {}", err);
            ExitCode::FAILURE
        }
        Err(CliError::Output(err)) => {
            eprintln!("输出序列化失败: {}", err);
            ExitCode::FAILURE
        }
    }
}
