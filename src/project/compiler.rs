use std::process::Stdio;

use eyre::{Result, WrapErr, eyre};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::{Project, ProjectType};

/// Output from running the toolchain compiler
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Warnings and notes, surfaced to the user even on success
    pub stderr: String,
}

/// Toolchain command that compiles the whole project
fn compile_command(project_type: ProjectType) -> (&'static str, &'static [&'static str]) {
    match project_type {
        ProjectType::Foundry => ("forge", &["build"]),
        ProjectType::Hardhat => ("npx", &["hardhat", "compile"]),
    }
}

/// Compile every contract in the project with its own toolchain
pub async fn compile(project: &Project) -> Result<CompileOutput> {
    let (program, args) = compile_command(project.project_type);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&project.root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::info!(
        "Compiling {} project '{}' with `{} {}`",
        project.project_type,
        project.name,
        program,
        args.join(" ")
    );

    let mut child = cmd
        .spawn()
        .wrap_err_with(|| format!("Failed to spawn {} command", program))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| eyre!("Compiler stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| eyre!("Compiler stderr was not captured"))?;

    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    let mut stdout_output = String::new();
    let mut stderr_output = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    // Read output concurrently
    while !(stdout_done && stderr_done) {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(l)) => {
                        tracing::debug!("{}", l);
                        stdout_output.push_str(&l);
                        stdout_output.push('\n');
                    }
                    Ok(None) => stdout_done = true,
                    Err(e) => {
                        tracing::warn!("Error reading compiler stdout: {}", e);
                        stdout_done = true;
                    }
                }
            }
            line = stderr_lines.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(l)) => {
                        tracing::debug!("{}", l);
                        stderr_output.push_str(&l);
                        stderr_output.push('\n');
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        tracing::warn!("Error reading compiler stderr: {}", e);
                        stderr_done = true;
                    }
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .wrap_err_with(|| format!("Failed to wait for {}", program))?;

    if !status.success() {
        let detail = if stderr_output.trim().is_empty() {
            stdout_output.trim()
        } else {
            stderr_output.trim()
        };
        return Err(eyre!("Compilation failed ({}):\n{}", status, detail));
    }

    tracing::info!("Compilation finished");

    Ok(CompileOutput {
        stderr: stderr_output,
    })
}
