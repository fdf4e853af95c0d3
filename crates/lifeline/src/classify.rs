// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lifeline classify` command implementation.
//!
//! Runs the classifier on answers given as flags and prints the result as
//! JSON. Nothing is audited and no operator is notified.

use lifeline_core::{LifelineError, RegionCode, TriageAnswers, TriageResult, crisis_resources};
use lifeline_router::classify;

use crate::ClassifyArgs;

pub fn run_classify(args: &ClassifyArgs) -> Result<(), LifelineError> {
    let output = classify_to_json(args)?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| LifelineError::Internal(format!("failed to render result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn classify_to_json(args: &ClassifyArgs) -> Result<serde_json::Value, LifelineError> {
    let mut answers = TriageAnswers::new(
        args.immediate_danger,
        args.harm_self,
        args.harm_others,
        args.need_help_soon,
        args.need_help_today,
    );
    if let Some(region) = &args.region {
        answers = answers.with_region(region.parse::<RegionCode>()?);
    }

    let result = TriageResult::from_risk(classify(&answers), answers.region_code);
    let mut value = serde_json::to_value(result)
        .map_err(|e| LifelineError::Internal(format!("failed to encode result: {e}")))?;

    if result.crisis_mode()
        && let Some(object) = value.as_object_mut()
    {
        let resources = serde_json::to_value(crisis_resources(result.region_code()))
            .map_err(|e| LifelineError::Internal(format!("failed to encode resources: {e}")))?;
        object.insert("resources".to_string(), resources);
    }

    Ok(value)
}
