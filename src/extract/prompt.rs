//! The fixed instruction contract sent with every article.

/// Rough conversion rates into USD.
///
/// Amounts only need to be approximately right, so these are constants with
/// no effective date. They are rendered into the prompt verbatim.
pub const APPROX_USD_RATES: &[(&str, f64)] = &[
    ("1 EUR", 1.10),
    ("1 GBP", 1.27),
    ("1 CHF", 1.12),
    ("1 CAD", 0.73),
    ("1 AUD", 0.66),
    ("1 SGD", 0.74),
    ("1 JPY", 0.0067),
    ("1 INR", 0.012),
    ("1 INR lakh (₹1 L)", 1_200.0),
    ("1 INR crore (₹1 Cr)", 120_000.0),
];

const INSTRUCTIONS: &str = r#"You extract funding facts from startup news. Read the article below and reply with ONE JSON object and nothing else: no prose, no markdown, no code fences.

Rules:
- Never guess. Any value the text does not clearly state must be null (or an empty list for investors).
- website_url: only a URL that literally appears in the text (a link, a "Visit: https://..." line, a press-release footer). Never infer or construct one.
- amount_raised_usd: an integer number of US dollars. "$5M" is 5000000. Convert other currencies with the rough rates below; an approximate figure is fine.
- investors: a list of strings naming every investor mentioned.
- lead_investor: the investor explicitly described as leading the round.

Approximate rates:
{rates}

Reply with exactly this shape:
{
  "company_name": string or null,
  "website_url": string or null,
  "amount_raised_usd": integer or null,
  "funding_round": string or null,
  "investors": [string],
  "lead_investor": string or null,
  "headquarter_country": string or null
}

ARTICLE:
{context}
"#;

/// Build the extraction prompt for one article.
pub fn build_prompt(title: &str, body: &str) -> String {
    let rates = APPROX_USD_RATES
        .iter()
        .map(|(unit, usd)| format!("- {unit} ≈ {usd} USD"))
        .collect::<Vec<_>>()
        .join("\n");
    let context = format!("TITLE: {title}\nBODY: {body}");
    INSTRUCTIONS
        .replace("{rates}", &rates)
        .replace("{context}", &context)
}
