//! Command dispatch: maps parsed arguments onto application services

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::instrument;

use crate::cli::args::{BackupCommands, Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{NewUnit, OrgUnit, UnitUpdate};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => _config(command),
        Some(command) => {
            let settings = Settings::load()?;
            let container = ServiceContainer::new(settings)?;
            dispatch(&container, command)
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    }
}

fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Tree => _tree(container),
        Commands::Show { id } => _show(container, id),
        Commands::Create {
            parent_id,
            id,
            name,
            unit_type,
            cost_center,
            manager,
        } => _create(
            container,
            parent_id,
            NewUnit {
                id: id.clone(),
                name: name.clone(),
                unit_type: unit_type.clone(),
                cost_center: cost_center.clone(),
                manager: manager.clone(),
            },
        ),
        Commands::Update {
            id,
            name,
            manager,
            clear_manager,
            cost_center,
            unit_type,
        } => _update(
            container,
            id,
            UnitUpdate {
                name: name.clone(),
                manager: manager.clone(),
                clear_manager: *clear_manager,
                cost_center: cost_center.clone(),
                unit_type: unit_type.clone(),
            },
        ),
        Commands::Delete { id, reassign_to } => _delete(container, id, reassign_to.as_deref()),
        Commands::Move { id, new_parent_id } => _move(container, id, new_parent_id),
        Commands::CheckCc { cost_center } => _check_cc(container, cost_center),
        Commands::Types { children_of } => _types(container, children_of.as_deref()),
        Commands::Validate => _validate(container),
        Commands::Report { id } => _report(container, id),
        Commands::Backup { command } => _backup(container, command),
        // Handled before the container is built
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer) -> CliResult<()> {
    let root = container.organization.get_tree()?;
    output::info(&render_tree(&root));
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let unit = container.organization.get_unit(id)?;
    let json = serde_json::to_string_pretty(&unit)
        .map_err(|e| crate::application::ApplicationError::persistence("serialize unit", e))?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(container, fields))]
fn _create(container: &ServiceContainer, parent_id: &str, fields: NewUnit) -> CliResult<()> {
    let created = container.organization.create_unit(parent_id, fields)?;
    output::action("created", &format!("{} under {}", created.id, parent_id));
    Ok(())
}

#[instrument(skip(container, update))]
fn _update(container: &ServiceContainer, id: &str, update: UnitUpdate) -> CliResult<()> {
    let updated = container.organization.update_unit(id, update)?;
    output::action("updated", &updated.id);
    Ok(())
}

#[instrument(skip(container))]
fn _delete(container: &ServiceContainer, id: &str, reassign_to: Option<&str>) -> CliResult<()> {
    container.organization.delete_unit(id, reassign_to)?;
    match reassign_to {
        Some(target) => output::action("deleted", &format!("{id} (children moved to {target})")),
        None => output::action("deleted", &id),
    }
    Ok(())
}

#[instrument(skip(container))]
fn _move(container: &ServiceContainer, id: &str, new_parent_id: &str) -> CliResult<()> {
    let moved = container.organization.move_unit(id, new_parent_id)?;
    output::action("moved", &format!("{} under {}", moved.id, new_parent_id));
    Ok(())
}

#[instrument(skip(container))]
fn _check_cc(container: &ServiceContainer, cost_center: &str) -> CliResult<()> {
    let check = container.organization.check_cost_center(cost_center)?;
    if check.available {
        output::success(&format!("cost center {cost_center} is available"));
    } else if let Some(unit) = &check.conflicting_unit {
        output::failure(&format!(
            "cost center {cost_center} is taken by {} ({})",
            unit.id, unit.name
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _types(container: &ServiceContainer, children_of: Option<&str>) -> CliResult<()> {
    let options = match children_of {
        Some(parent_type) => container.organization.list_allowed_child_types(parent_type)?,
        None => container.organization.list_types(),
    };
    for option in options {
        output::info(&format!("{:<12} {}", option.value, option.label));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _validate(container: &ServiceContainer) -> CliResult<()> {
    let outcome = container.organization.validate()?;
    if outcome.valid {
        output::success("organization document is valid");
        Ok(())
    } else {
        output::header(&format!("{} issue(s) found:", outcome.issues.len()));
        for issue in &outcome.issues {
            output::failure(issue);
        }
        std::process::exit(crate::exitcode::DATAERR);
    }
}

#[instrument(skip(container))]
fn _report(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let report = container.report.unit_report(id)?;

    output::header(&format!(
        "{} [{}] — {}",
        report.unit_name, report.type_label, report.year
    ));
    output::detail(&format!(
        "aggregated over {} cost center(s): {}",
        report.scope.len(),
        report.scope.join(", ")
    ));

    output::info("");
    output::header("Economy (yearly, kSEK)");
    output::info(&format!(
        "  {:<12} {:>14} {:>14} {:>9}",
        "group", "budget", "actual", "variance"
    ));
    for row in &report.economy_rows {
        output::info(&format!(
            "  {:<12} {:>14.1} {:>14.1} {:>8.1}%",
            row.group, row.budget, row.actual, row.variance
        ));
    }
    output::info(&format!(
        "  {:<12} {:>14.1} {:>14.1} {:>8.1}%",
        "result", report.result_budget, report.result_actual, report.result_variance
    ));

    output::info("");
    output::header("Personnel");
    for figure in &report.personnel_figures {
        print_figure(figure);
    }

    output::info("");
    output::header("Production");
    for figure in &report.production_figures {
        print_figure(figure);
    }

    Ok(())
}

fn print_figure(figure: &crate::application::services::MetricFigure) {
    let rendered = match figure.value {
        Some(value) => output::colorize_status(&format!("{value}"), figure.status),
        None => "-".to_string(),
    };
    output::info(&format!("  {:<24} {}", metric_label(&figure.key), rendered));
}

fn metric_label(key: &str) -> &str {
    match key {
        "antal_anstallda" => "headcount",
        "personalomsattning" => "turnover rate (%)",
        "sjukfranvaro" => "sick leave rate (%)",
        "arenden" => "case volume",
        "leveranstid" => "delivery time (days)",
        "kundnojdhet" => "customer satisfaction",
        "kvalitetsindex" => "quality index",
        _ => key,
    }
}

#[instrument(skip(container))]
fn _backup(container: &ServiceContainer, command: &BackupCommands) -> CliResult<()> {
    match command {
        BackupCommands::Create => {
            let path = container.organization.snapshot()?;
            output::action("snapshot", &path.display());
            Ok(())
        }
        BackupCommands::List => {
            let backups = container.organization.list_backups()?;
            if backups.is_empty() {
                output::info("no backups");
            }
            for name in backups {
                output::info(&name);
            }
            Ok(())
        }
    }
}

fn _config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
    }
}

fn render_tree(unit: &OrgUnit) -> termtree::Tree<String> {
    let label = format!("{} [{}] ({})", unit.name, unit.unit_type, unit.cost_center);
    let mut tree = termtree::Tree::new(label);
    for child in &unit.children {
        tree.push(render_tree(child));
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, children: Vec<OrgUnit>) -> OrgUnit {
        OrgUnit {
            id: id.to_string(),
            name: id.to_uppercase(),
            unit_type: "division".to_string(),
            cost_center: "1000".to_string(),
            manager: None,
            children,
        }
    }

    #[test]
    fn given_nested_units_when_rendering_then_all_nodes_appear() {
        let root = unit("root", vec![unit("a", vec![unit("b", vec![])]), unit("c", vec![])]);

        let rendered = render_tree(&root).to_string();

        assert!(rendered.contains("ROOT [division] (1000)"));
        assert!(rendered.contains("A [division] (1000)"));
        assert!(rendered.contains("B [division] (1000)"));
        assert!(rendered.contains("C [division] (1000)"));
    }
}
