//! 内容审核分类器
//!
//! 纯函数、无状态、确定性：输入消息文本，输出
//! `IllegalSale`（非法售卖）/ `Abusive`（辱骂）/ `Clean`。
//!
//! 流水线：
//! 1. 规范化：小写、折叠土耳其语变音字母、压缩 3 个以上的
//!    重复字母（对抗拉长写法）、非字母数字折叠为单个空格；
//! 2. 去空白形（squish）：在规范化基础上去掉所有分隔符
//!    （对抗 "s a t i s" 式的隔空写法）；
//! 3. 非法售卖检测，优先级高于一切其他判定；
//! 4. 三类辱骂检测（脏话 / 骚扰 / 泛化攻击句式），任一命中即
//!    记一次违规，多类命中不叠加。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 分类结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// 毒品引用 + 售卖意图（或联系渠道句式）同时出现。
    IllegalSale,
    /// 任一辱骂类别命中。
    Abusive(AbuseFlags),
    Clean,
}

/// 辱骂检测的三个独立类别标记。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseFlags {
    pub profanity: bool,
    pub harassment: bool,
    pub hate: bool,
}

impl AbuseFlags {
    pub fn any(&self) -> bool {
        self.profanity || self.harassment || self.hate
    }
}

/// 毒品引用词表。
const DRUG_TERMS: &[&str] = &[
    "esrar",
    "bonzai",
    "skunk",
    "weed",
    "gras",
    "uyusturucu",
    "extacy",
    "eksta",
    "kokain",
];

/// 售卖意图词表。
const SALE_TERMS: &[&str] = &[
    "satilik",
    "satis",
    "satiyorum",
    "satarim",
    "alirim",
    "toptan",
    "fiyat",
    "kapora",
    "sell",
    "selling",
    "buy",
    "price",
];

/// 脏话词表。
const PROFANITY_TERMS: &[&str] = &[
    "salak",
    "aptal",
    "gerizekali",
    "serefsiz",
    "idiot",
    "stupid",
    "moron",
    "scumbag",
];

/// 骚扰词表。
const HARASSMENT_TERMS: &[&str] = &[
    "defol",
    "kes sesini",
    "git buradan",
    "kimse seni sevmiyor",
    "senden nefret",
    "shut up",
    "get lost",
    "worthless",
    "nobody likes you",
];

/// 联系渠道句式："{telegram|whatsapp|wp|dm} ... {yaz|gel|ulas|write|come}"，
/// 与毒品引用词共现时判定为售卖。`[a-z]{0,4}` 吸收
/// "telegramdan" 之类的土耳其语格后缀，`\s*` 同时覆盖
/// 规范化形与去空白形。
static CONTACT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(telegram|whatsapp|wp|dm)[a-z]{0,4}\s*(yaz|gel|ulas|write|come)")
        .expect("contact pattern must compile")
});

/// 泛化攻击句式：针对"你们这些人"式的群体指向。
/// 刻意不指名任何具体群体，只识别句式结构。
static HATE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(hepiniz|sizin\s*gibiler|your\s*kind|you\s*people|all\s*of\s*you)")
        .expect("hate target pattern must compile")
});

static HATE_PREDICATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(pislik|asagilik|insan\s*degil|buraya\s*ait\s*degil|disgusting|vermin|trash|dont\s*belong)")
        .expect("hate predicate pattern must compile")
});

/// 规范化：小写 + 变音折叠 + 重复字母压缩 + 分隔符折叠。
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if let Some(c) = fold_accent(c) {
            folded.push(c);
        }
    }

    // 3 个以上的连续相同字母压缩为 2 个
    let mut collapsed = String::with_capacity(folded.len());
    let mut prev = None;
    let mut run = 0usize;
    for c in folded.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 2 || !c.is_alphanumeric() {
            collapsed.push(c);
        }
    }

    // 非字母数字的连续段折叠为单个空格
    let mut out = String::with_capacity(collapsed.len());
    let mut in_separator = false;
    for c in collapsed.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            in_separator = false;
        } else if !in_separator {
            out.push(' ');
            in_separator = true;
        }
    }
    out.trim().to_owned()
}

/// 去空白形：规范化后去掉所有分隔符。
pub fn squish(text: &str) -> String {
    normalize(text).chars().filter(|c| c.is_alphanumeric()).collect()
}

/// 土耳其语变音字母折叠。返回 `None` 表示丢弃该字符
/// （'İ' 小写后遗留的组合用上点）。
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'ç' => 'c',
        'ğ' => 'g',
        'ı' => 'i',
        'ö' => 'o',
        'ş' => 's',
        'ü' => 'u',
        'â' => 'a',
        'î' => 'i',
        'û' => 'u',
        'é' => 'e',
        '\u{0307}' => return None,
        other => other,
    };
    Some(folded)
}

/// 所有相同字符的连续段压缩为 1 个。词表比对时额外使用，
/// 使"拉长写法"在压缩到 2 之后仍能与原词对齐。
fn dedup_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if prev != Some(c) {
            out.push(c);
            prev = Some(c);
        }
    }
    out
}

/// 词表命中：在规范化形、去空白形或二者的去重形中任一出现。
fn contains_any(terms: &[&str], norm: &str, squished: &str, dedup_squished: &str) -> bool {
    terms.iter().any(|term| {
        let term_squished: String = term.chars().filter(|c| !c.is_whitespace()).collect();
        norm.contains(term)
            || squished.contains(term_squished.as_str())
            || dedup_squished.contains(dedup_runs(&term_squished).as_str())
    })
}

/// 句式命中：对三种派生形分别跑一次正则。
fn matches_pattern(pattern: &Regex, norm: &str, squished: &str, dedup_squished: &str) -> bool {
    pattern.is_match(norm) || pattern.is_match(squished) || pattern.is_match(dedup_squished)
}

/// 对一条消息文本做完整分类。
pub fn classify(text: &str) -> Verdict {
    let norm = normalize(text);
    let squished: String = norm.chars().filter(|c| c.is_alphanumeric()).collect();
    let dedup_squished = dedup_runs(&squished);

    let has_drug = contains_any(DRUG_TERMS, &norm, &squished, &dedup_squished);
    if has_drug {
        let has_sale = contains_any(SALE_TERMS, &norm, &squished, &dedup_squished);
        let has_contact = matches_pattern(&CONTACT_PATTERN, &norm, &squished, &dedup_squished);
        if has_sale || has_contact {
            return Verdict::IllegalSale;
        }
    }

    let flags = AbuseFlags {
        profanity: contains_any(PROFANITY_TERMS, &norm, &squished, &dedup_squished),
        harassment: contains_any(HARASSMENT_TERMS, &norm, &squished, &dedup_squished),
        hate: matches_pattern(&HATE_TARGET, &norm, &squished, &dedup_squished)
            && matches_pattern(&HATE_PREDICATE, &norm, &squished, &dedup_squished),
    };

    if flags.any() {
        Verdict::Abusive(flags)
    } else {
        Verdict::Clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_abusive(v: Verdict) -> bool {
        matches!(v, Verdict::Abusive(_))
    }

    #[test]
    fn clean_text_passes() {
        assert_eq!(classify("bugün hava çok güzel"), Verdict::Clean);
        assert_eq!(classify("selam, nasılsın?"), Verdict::Clean);
        assert_eq!(classify(""), Verdict::Clean);
    }

    #[test]
    fn drug_plus_sale_is_illegal_in_both_orders() {
        assert_eq!(classify("satilik esrar var"), Verdict::IllegalSale);
        assert_eq!(classify("esrar satilik"), Verdict::IllegalSale);
        assert_eq!(classify("weed price is good"), Verdict::IllegalSale);
    }

    #[test]
    fn drug_without_sale_is_not_illegal() {
        assert_eq!(classify("esrar kötü bir şey, kullanmayın"), Verdict::Clean);
    }

    #[test]
    fn sale_without_drug_is_not_illegal() {
        assert_eq!(classify("satilik araba, fiyat uygun"), Verdict::Clean);
    }

    #[test]
    fn contact_pattern_with_drug_is_illegal() {
        assert_eq!(classify("esrar lazımsa telegramdan yaz"), Verdict::IllegalSale);
        assert_eq!(classify("weed için whatsapp gel"), Verdict::IllegalSale);
        assert_eq!(classify("dm yaz bonzai"), Verdict::IllegalSale);
    }

    #[test]
    fn contact_pattern_without_drug_is_not_illegal() {
        assert_eq!(classify("sorun olursa telegramdan yaz"), Verdict::Clean);
    }

    #[test]
    fn classification_invariant_under_uppercasing() {
        assert_eq!(classify("SATILIK ESRAR"), Verdict::IllegalSale);
        assert_eq!(classify("SALAK"), classify("salak"));
    }

    #[test]
    fn classification_invariant_under_letter_stretching() {
        assert_eq!(classify("saaatilik esraaaar"), Verdict::IllegalSale);
        assert!(is_abusive(classify("salaaaak")));
    }

    #[test]
    fn classification_invariant_under_whitespace_removal() {
        assert_eq!(classify("s a t i s   e s r a r"), Verdict::IllegalSale);
        assert!(is_abusive(classify("s a l a k")));
    }

    #[test]
    fn accented_substitutions_are_folded() {
        // "şatılık" -> "satilik"
        assert_eq!(classify("şatılık esrâr"), Verdict::IllegalSale);
        assert!(is_abusive(classify("şalak")));
    }

    #[test]
    fn illegal_sale_takes_precedence_over_abuse() {
        assert_eq!(classify("salak, satilik esrar var"), Verdict::IllegalSale);
    }

    #[test]
    fn profanity_sets_only_profanity_flag() {
        match classify("tam bir salaksın") {
            Verdict::Abusive(flags) => {
                assert!(flags.profanity);
                assert!(!flags.harassment);
                assert!(!flags.hate);
            }
            other => panic!("expected abusive, got {other:?}"),
        }
    }

    #[test]
    fn harassment_phrases_are_detected() {
        match classify("defol git kes sesini") {
            Verdict::Abusive(flags) => assert!(flags.harassment),
            other => panic!("expected abusive, got {other:?}"),
        }
        match classify("you are worthless, shut up") {
            Verdict::Abusive(flags) => assert!(flags.harassment),
            other => panic!("expected abusive, got {other:?}"),
        }
    }

    #[test]
    fn hate_requires_target_and_predicate() {
        assert!(is_abusive(classify("hepiniz pisliksiniz")));
        assert!(is_abusive(classify("you people are disgusting")));
        // 只有指向没有谓语，或者反过来，都不算
        assert_eq!(classify("hepiniz buraya gelin"), Verdict::Clean);
        assert_eq!(classify("bu oda disgusting"), Verdict::Clean);
    }

    #[test]
    fn multiple_abuse_categories_do_not_change_verdict_kind() {
        let v = classify("salak, defol buradan");
        match v {
            Verdict::Abusive(flags) => {
                assert!(flags.profanity && flags.harassment);
            }
            other => panic!("expected abusive, got {other:?}"),
        }
    }

    #[test]
    fn normalize_collapses_repeats_and_separators() {
        assert_eq!(normalize("Heeeey!!!   ARKADAŞLAR"), "heey arkadaslar");
        assert_eq!(normalize("  a---b  "), "a b");
    }

    #[test]
    fn squish_removes_all_separators() {
        assert_eq!(squish("s a t i s"), "satis");
        assert_eq!(squish("a-b c"), "abc");
    }

    #[test]
    fn dotted_capital_i_is_folded() {
        // 'İ'.to_lowercase() 产生 "i\u{307}"，组合点必须被丢弃
        assert_eq!(normalize("İyİ"), "iyi");
    }
}
