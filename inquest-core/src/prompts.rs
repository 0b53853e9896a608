//! Prompt templates for each pipeline stage.
//!
//! Each function renders the full prompt text for one stage. The expected
//! response shape is documented next to the stage's parse struct in
//! `engine::stages`; prompts here instruct the model to emit exactly that
//! shape so the strict parse step can hold it to it.

/// Entity extraction: parse the raw query into the primary investigative entities.
pub fn entity_extraction(query: &str) -> String {
    format!(
        r#"You are a query analysis agent for an investigative research service. Parse the user's raw query and extract the primary entities to investigate.

User query: "{query}"

Identify the main person, organization, location, or event the query is about.
Respond with ONLY a JSON object of the form {{"entities": ["..."]}} — a single key "entities" holding a list of strings, and no other text."#
    )
}

/// Tool orchestration: pick the single best tool and sub-query for the next step.
pub fn orchestrator(
    query: &str,
    analysis: &str,
    candidate_queries: &[String],
    tool_names: &[String],
) -> String {
    format!(
        r#"You are the orchestrator of an investigative research pipeline. Choose the single best retrieval tool and query to advance the investigation.

Current investigation state:
- Subject query: {query}
- Analysis so far: {analysis}
- Candidate follow-up queries: {candidates}

Available tools: {tools}

Pick one tool from the available tools and formulate one precise query for it, preferring the most promising candidate follow-up.

Respond with ONLY a JSON object with exactly two keys and no other text:
{{"tool_name": "<one of: {tools}>", "query": "<the query to run>"}}"#,
        candidates = candidate_queries.join("; "),
        tools = tool_names.join(", "),
    )
}

/// Analysis: synthesize collected data and suggest the next queries.
pub fn analyst(query: &str, analysis: &str, context: &str, max_follow_ups: usize) -> String {
    format!(
        r#"You are the analyst of an investigative research pipeline. Synthesize everything collected so far about "{query}", identify what is still missing, and suggest next steps.

Existing analysis: {analysis}

Collected data:
---
{context}
---

Tasks:
1. Update the analysis with any key new information (2-3 sentences).
2. Suggest up to {max_follow_ups} specific follow-up search queries that would fill the remaining gaps. If the investigation is complete or has hit a dead end, suggest none.

Respond with ONLY a JSON object of the form:
{{"analysis": "<updated summary>", "follow_up_queries": ["<query>", ...]}}
Return an empty list to end the investigation."#
    )
}

/// Cleaning / entity resolution: split possibly conflated data into distinct profiles.
pub fn cleaner(query: &str, context: &str) -> String {
    format!(
        r#"You are an entity-resolution analyst. The raw text below was collected about the subject "{query}" and may conflate SEVERAL different identities with similar names. Separate them.

---RAW CONTEXT---
{context}
---

Rules:
1. Assume conflation until the data proves otherwise; look for contradictions in timelines, professions, and locations.
2. Create one profile per distinct identity you can support with the data.
3. Give each profile a confidence_score between 0.0 and 1.0.
4. List only facts present in the raw context as supporting_facts.

Respond with ONLY a JSON object of the form:
{{"profiles": [{{"confidence_score": 0.0, "profile_name": "...", "summary": "...", "supporting_facts": ["..."]}}]}}"#
    )
}

/// Report writing: draft the intelligence brief from resolved profiles.
pub fn report_writer(query: &str, cleaned_json: &str) -> String {
    format!(
        r#"You are an intelligence analyst writing a concise, fact-based brief about "{query}" from structured profile data. Report with accuracy and state uncertainty plainly.

---STRUCTURED PROFILES---
{cleaned_json}
---

Rules:
1. If there is more than one profile, the primary finding is that the data is likely conflated; say so in the executive summary and present each profile separately.
2. If there is one clear profile, report only the facts inside it.
3. Prefer bullet points over narrative; explicitly list missing key information.

Structure the brief as:
1. Executive Summary
2. Detailed Findings
3. Risk Assessment (conflated data is MEDIUM or HIGH risk by itself)
4. Information Gaps & Recommendations

Respond with the report text only."#
    )
}

/// Judging: verify the report is consistent with the cleaned source data.
pub fn judge(cleaned_json: &str, report: &str) -> String {
    format!(
        r#"You are a quality-control reviewer. Decide whether the generated report below is factually consistent with the source data and free of speculation.

Source data (resolved profiles):
---
{cleaned_json}
---

Generated report:
---
{report}
---

Respond with ONLY a JSON object of the form:
{{"is_accurate": true, "reasoning": "<brief explanation>"}}
"is_accurate" must be true only if every statement in the report is supported by the source data."#
    )
}
