//! Per-operation option assembly

use axum::http::HeaderMap;

use super::parse::{parse_conditions, parse_range, parse_sort_by, QueryParams, SORT_PARAM};
use super::{Options, Placement, PlacementMode, SortSpec};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::store::StoreDescriptor;

const PLACEMENT_HEADER: &str = "placement";
const PLACEMENT_AFTER_HEADER: &str = "placement-after";

/// Build the [`Options`] for one operation
///
/// | operation | contributes                                           |
/// |-----------|-------------------------------------------------------|
/// | get       | conditions                                            |
/// | getQuery  | sort, range, conditions, `delete_after_query`         |
/// | put       | `overwrite` from `If-Match`/`If-None-Match`, placement |
/// | post      | placement                                             |
/// | delete    | nothing                                               |
///
/// The store's default sort then fills in for a missing or empty sort.
pub fn assemble_options(
    operation: Operation,
    headers: &HeaderMap,
    query: &QueryParams,
    descriptor: &StoreDescriptor,
) -> Result<Options> {
    let mut options = Options::default();

    if operation == Operation::Put {
        if lenient_header(headers, "if-match") == Some("*") {
            options.overwrite = Some(true);
        }
        // Evaluated second, so it wins when both are sent
        if lenient_header(headers, "if-none-match") == Some("*") {
            options.overwrite = Some(false);
        }
    }

    if operation == Operation::GetQuery && descriptor.delete_after_get_query {
        options.delete_after_query = true;
    }

    if matches!(operation, Operation::Put | Operation::Post) {
        options.placement = parse_placement(headers)?;
    }

    if operation == Operation::GetQuery {
        options.sort = Some(parse_sort_by(
            query.get(SORT_PARAM),
            &descriptor.sortable_fields,
        )?);
        options.range = Some(parse_range(
            lenient_header(headers, "range"),
            descriptor.default_page_limit,
        ));
    }

    if matches!(operation, Operation::Get | Operation::GetQuery) {
        options.conditions = parse_conditions(query);
    }

    if let Some(default_sort) = &descriptor.default_sort {
        if options.sort.as_ref().map_or(true, SortSpec::is_empty) {
            options.sort = Some(default_sort.clone());
        }
    }

    Ok(options)
}

fn parse_placement(headers: &HeaderMap) -> Result<Option<Placement>> {
    let Some(mode) = header_str(headers, PLACEMENT_HEADER)? else {
        return Ok(None);
    };

    let mode: PlacementMode = mode.parse()?;
    let after_id = match mode {
        PlacementMode::After => header_str(headers, PLACEMENT_AFTER_HEADER)?.map(str::to_string),
        PlacementMode::Start | PlacementMode::End => None,
    };

    Ok(Some(Placement { mode, after_id }))
}

/// Header value, treating non-ASCII bytes the same as a missing header
fn lenient_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| Error::BadRequest(format!("Header '{name}' is not valid ASCII")))
        })
        .transpose()
}
