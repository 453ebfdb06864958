//! The example drug-information card.
//!
//! Sent inside the structured-card prompt as a one-shot format exemplar so
//! the completion service reproduces the exact layout for other substances.

const SEARCH_URL: &str =
    "https://psychonautwiki.org/w/index.php?search=Gabapentin&title=Special%3ASearch&go=Go";

/// The fixed Gabapentin reference card. Always returns the same text.
pub fn example_card() -> String {
    format!(
        r#"**[Gabapentin]({SEARCH_URL})**

**🔭 Class**
- ✴️ **Chemical:** ➡️ Gabapentinoids
- ✴️ **Psychoactive:** ➡️ Depressant

**⚖️ Dosages**
- ✴️ **ORAL ✴️**
  - **Threshold:** 200mg
  - **Light:** 200 - 600mg
  - **Common:** 600 - 900mg
  - **Strong:** 900 - 1200mg
  - **Heavy:** 1200mg+

**⏱️ Duration:**
- ✴️ **ORAL ✴️**
  - **Onset:** 30 - 90 minutes
  - **Total:** 5 - 8 hours

**⚠️ Addiction Potential ⚠️**
- No addiction potential information.

**Notes**
- Likely to have a cross-tolerance with other Gabapentinoids, such as Pregabalin and Mirogabalin.

**🧠 Subjective Effects**
  - **Focus enhancement**
  - **Euphoria**

**📈 Tolerance:**
  - **Full:** with prolonged continuous usage
  - **Baseline:** 7-14 days
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_sections() {
        let card = example_card();
        for section in [
            "**🔭 Class**",
            "**⚖️ Dosages**",
            "**⏱️ Duration:**",
            "**⚠️ Addiction Potential ⚠️**",
            "**Notes**",
            "**🧠 Subjective Effects**",
            "**📈 Tolerance:**",
        ] {
            assert!(card.contains(section), "card missing section {section}");
        }
    }

    #[test]
    fn test_card_links_to_search() {
        assert!(example_card().starts_with("**[Gabapentin](https://psychonautwiki.org/"));
    }
}
