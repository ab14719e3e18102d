//! Operation command implementations

use ndbctl_core::{OperationSource, wait_for_operation};
use serde_json::json;

use crate::cli::{OperationCommands, OutputFormat};
use crate::commands::wait::{OperationSpinner, format_status};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{self, print_output};

pub async fn handle_operation_command(
    cmd: &OperationCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let format = output::OutputFormat::from(output_format);
    let client = conn_mgr.create_client(profile)?;

    match cmd {
        OperationCommands::Get { id } => {
            let operation = client.get_operation(id).await?;
            if format.is_table() {
                let status = format_status(&operation.status());
                print_output(
                    json!({
                        "id": operation.id,
                        "name": operation.name,
                        "type": operation.operation_type,
                        "status": status,
                        "percentage_complete": operation.percentage_complete,
                        "entity_id": operation.entity_id,
                        "message": operation.message,
                    }),
                    format,
                )?;
            } else {
                print_output(&operation, format)?;
            }
            Ok(())
        }

        OperationCommands::Wait {
            id,
            timeout,
            interval,
        } => {
            // Not tied to a lifecycle action, so the create timings apply
            let wait = conn_mgr.wait_options(
                profile,
                ndbctl_core::config::config::Action::Create,
                *timeout,
                *interval,
            );
            let spinner = OperationSpinner::start(
                &format!("Waiting for operation {}", id),
                format.is_table(),
            );
            let result = wait_for_operation(&client, id, wait, Some(spinner.callback())).await;
            spinner.finish();

            let result = result?;
            if !format.is_table() {
                print_output(&result.operation, format)?;
            }
            result.into_completed()?;
            Ok(())
        }
    }
}
