//! Parsing of interactive session input.

use anyhow::{bail, Context, Result};
use wayfinder_core::driver::UserAction;
use wayfinder_core::models::{PathPoint, Place};
use wayfinder_core::navigator::Command;

pub const HELP: &str = "\
Commands:
  start <lat,lng> [name]   set the start
  end <lat,lng> [name]     set the destination
  pick <lat,lng>           select a location on the map
  here                     use the current location
  add-stop                 next picked location becomes a stop
  remove-stop <n>          remove stop n
  route                    find the route
  nav | stop-nav           start or stop navigation
  save                     save the route to history
  load <n>                 load saved route n
  clear-history            delete all saved routes
  clear                    reset waypoints and route
  quit";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Action(UserAction),
    Help,
    Empty,
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Action(UserAction::Navigate(command))
    }
}

/// Parse "lat,lng" into a point.
pub fn parse_point(text: &str) -> Result<PathPoint> {
    let Some((lat, lng)) = text.split_once(',') else {
        bail!("expected <lat,lng>, got '{}'", text);
    };
    let lat: f64 = lat.trim().parse().with_context(|| format!("bad latitude '{}'", lat))?;
    let lng: f64 = lng.trim().parse().with_context(|| format!("bad longitude '{}'", lng))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        bail!("coordinates out of range: {}, {}", lat, lng);
    }
    Ok(PathPoint::new(lat, lng))
}

fn place_arg(args: &[&str]) -> Result<Place> {
    let Some(coords) = args.first() else {
        bail!("missing <lat,lng>");
    };
    let point = parse_point(coords)?;
    let name = args[1..].join(" ");
    Ok(if name.is_empty() {
        Place::dropped_pin(point.lat, point.lng)
    } else {
        Place::new(point.lat, point.lng, name)
    })
}

/// 1-based list position from the user, as a 0-based index.
fn position_arg(args: &[&str]) -> Result<usize> {
    let Some(raw) = args.first() else {
        bail!("missing position");
    };
    let position: usize = raw.parse().with_context(|| format!("bad position '{}'", raw))?;
    if position == 0 {
        bail!("positions start at 1");
    }
    Ok(position - 1)
}

pub fn parse_line(line: &str) -> Result<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(Input::Empty);
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "start" => Command::SetStart(place_arg(args)?).into(),
        "end" => Command::SetEnd(place_arg(args)?).into(),
        "pick" => {
            let point = parse_point(args.first().copied().unwrap_or_default())?;
            Command::SelectLocation(Place::dropped_pin(point.lat, point.lng)).into()
        }
        "here" => Command::UseCurrentLocation.into(),
        "add-stop" => Command::AddStop.into(),
        "remove-stop" => Command::RemoveStop(position_arg(args)?).into(),
        "route" => Command::FindRoute.into(),
        "nav" => Command::StartNav.into(),
        "stop-nav" => Command::StopNav.into(),
        "save" => Command::SaveRoute.into(),
        "clear" => Command::Clear.into(),
        "load" => Input::Action(UserAction::LoadHistory(position_arg(args)?)),
        "clear-history" => Input::Action(UserAction::ClearHistory),
        "quit" | "exit" => Input::Action(UserAction::Shutdown),
        "help" | "?" => Input::Help,
        other => bail!("unknown command '{}', try 'help'", other),
    };
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_line(line).unwrap() {
            Input::Action(UserAction::Navigate(command)) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn named_and_unnamed_places() {
        assert_eq!(
            command("start 24.86,67.0 Home Sweet Home"),
            Command::SetStart(Place::new(24.86, 67.0, "Home Sweet Home"))
        );
        assert_eq!(
            command("END 24.87,67.01"),
            Command::SetEnd(Place::dropped_pin(24.87, 67.01))
        );
        // A space after the comma splits the pair.
        assert!(parse_line("end 24.87, 67.01").is_err());
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(command("remove-stop 1"), Command::RemoveStop(0));
        assert_eq!(
            parse_line("load 3").unwrap(),
            Input::Action(UserAction::LoadHistory(2))
        );
        assert!(parse_line("remove-stop 0").is_err());
        assert!(parse_line("load").is_err());
    }

    #[test]
    fn bad_coordinates_are_rejected() {
        assert!(parse_point("24.86").is_err());
        assert!(parse_point("north,67").is_err());
        assert!(parse_point("91,0").is_err());
        assert!(parse_line("pick").is_err());
    }

    #[test]
    fn blank_help_and_unknown() {
        assert_eq!(parse_line("   ").unwrap(), Input::Empty);
        assert_eq!(parse_line("help").unwrap(), Input::Help);
        assert_eq!(parse_line("quit").unwrap(), Input::Action(UserAction::Shutdown));
        assert!(parse_line("fly").is_err());
    }
}
