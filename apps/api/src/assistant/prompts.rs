// All LLM prompt text for job analysis and letter generation.
// Rendering is positional (`format!`), so caller text is never re-scanned for placeholders.

use crate::assistant::letter::LetterLanguage;

/// Literal the model must use for title/company/location it cannot extract.
pub const UNKNOWN: &str = "Bilinmiyor";

/// Literal the model must use when no language requirement is stated.
pub const NOT_SPECIFIED: &str = "Belirtilmemiş";

/// Header that opens the optional style-sample block.
pub const SAMPLE_SECTION_HEADER: &str = "--- SAMPLE LETTER EXPECTED FORMAT/TONE ---";

/// Header that opens the optional draft/notes block.
pub const DRAFT_SECTION_HEADER: &str = "--- APPLICANT DRAFT / INSTRUCTIONS ---";

/// Renders the job-analysis prompt. The model must answer with a six-field JSON object.
pub fn analysis_prompt(job_description: &str, cv_text: &str, link: &str) -> String {
    format!(
        r#"You are an expert HR recruiter and a career assistant.
Analyze the following Job Application details against the provided CV.

Job Link: {link}
Job Description:
{job_description}

Applicant CV:
{cv_text}

Provide the following as a structured JSON object with EXACTLY these six fields:
- "title": The job title (extract from description). If unknown, "{UNKNOWN}".
- "company": The company name (extract from description). If unknown, "{UNKNOWN}".
- "summary_tr": A concise summary of the job description in Turkish.
- "language_reqs": Extracted language requirements (e.g. English, German). If none, return "{NOT_SPECIFIED}".
- "location": The extracted location for the job (e.g. Istanbul, Remote). If unknown, "{UNKNOWN}".
- "score": An integer compatibility score from 0 to 100 indicating how well the CV matches the job. Weigh the whole CV against the whole job description (experience, seniority, domain, languages, location), not just keyword overlap."#
    )
}

/// Inputs to the letter prompt. Blank `sample_letter` / `draft` drop their blocks entirely.
#[derive(Debug, Clone, Copy)]
pub struct LetterPromptInput<'a> {
    pub job_description: &'a str,
    pub cv_text: &'a str,
    pub language: LetterLanguage,
    pub draft: &'a str,
    pub sample_letter: &'a str,
}

/// Renders the letter-generation prompt.
pub fn letter_prompt(input: &LetterPromptInput<'_>) -> String {
    let lang_name = input.language.display_name();

    let mut prompt = format!(
        r#"You are an expert copywriter and career coach.
Write a highly professional motivation letter for a job application.

CRITICAL RULE 1: The entire letter MUST be written in {lang_name}. Do NOT mix languages, even if the CV or Job Description is in a different language.
CRITICAL RULE 2: Output ONLY the plain text of the letter. Do NOT use markdown.
CRITICAL RULE 3: ABSOLUTELY NO MARKDOWN FORMATTING. Do not use asterisks (**), hashtags (#), or bold tags. Output ONLY raw, unformatted plain text.
CRITICAL RULE 4: If a SAMPLE LETTER is provided below, YOU MUST EXACTLY COPY the Name, Address, Email, and Phone number from the sample letter and use them as the applicant's details. DO NOT change or invent personal contact information.

--- JOB DESCRIPTION ---
{job_description}

--- APPLICANT CV ---
{cv_text}
"#,
        job_description = input.job_description,
        cv_text = input.cv_text,
    );

    if !input.sample_letter.trim().is_empty() {
        prompt.push_str(&format!(
            "\n{SAMPLE_SECTION_HEADER}\n\
             You MUST analyze its tone, structure, and writing style, and heavily mimic it in your generated letter:\n\
             {}\n",
            input.sample_letter
        ));
    }

    if !input.draft.trim().is_empty() {
        prompt.push_str(&format!(
            "\n{DRAFT_SECTION_HEADER}\n\
             CRITICAL RULE: The applicant has provided the following specific drafts, notes, or points.\n\
             You MUST incorporate these points prominently and seamlessly into the letter.\n\
             If they ask to mention a reference, do it. If they ask to mention a skill, do it. Do NOT ignore this!\n\
             NOTES/DRAFT:\n\
             {}\n",
            input.draft
        ));
    }

    prompt
}
