use crate::*;
use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::RngCore;
use std::fmt;

lazy_static! {
    /// Order of the subgroup, the 256-bit prime `2^256 - 189`.
    pub static ref Q: BigUint = parse_constant("115792089237316195423570985008687907853269984665640564039457584007913129639747");

    /// The 4096-bit prime modulus.
    pub static ref P: BigUint = parse_constant(
        "104438888141315250669175271071662438257996424904738378038423348328395390797155364353772999\
        312687588390217363401777741636050292608294637794295570449854209761484182524677358068939838\
        632043974791116089773155107490396724388342713291881374801626975452234350528589881677721176\
        191239277291448552115552164104927344620757896193984061946614580685927505347656097329515870\
        382339571021032931470971523925173655238408084583604877866731893141833842244389102591188472\
        343308470120777190194459328662497991739135056466263272370300796422984915475619689061525228\
        653308964318490270692608174414928951741824915363417834207538187413164601344479689458210687\
        053153580366625457960263245310374145256979390555190154185617325138504741484039275358558190\
        995015804625681054267836812127850996052095762473794291460031064660979266501285839738143575\
        590285131207124810259944230895132703925081889249376742332966378370919071616202352966921730\
        093978317141580823314682300076691778928615400604228142373370646290524377485454312723950024\
        587358201266366643058386277816736954760301634424272959224454460827940599975939109976916558\
        972258421601746846457621731855794846176577070091322046055759857471717340825291359624228119\
        0298966500668625620138188265530628036538314433100326660047110143"
    );

    /// Cofactor, `(P - 1) / Q`.
    pub static ref R: BigUint = parse_constant(
        "901951841695052855837347808651123265895147484252552040149611492815430426396965568792786744\
        256255931145792659351075726764906362868124106426095360918094746480095846739094948509642965\
        312291692870484154726512624740816785662002481550868447281974638411536914832254869643932797\
        975294831171250611389004528790733565630894563014196947248410055856587958547654778271728310\
        683794592369380697301751049273083840938101470125820269424576060271860255073920529725794096\
        999237179932587017974619167246473672142461763997332409028895200626048322289426992817997015\
        363422039028725583762533166855593303919919461982437586929127109893500069978534640505516039\
        468863707459951905265551738859632747327390602986903098806460736116580312971877387718541544\
        529167108902984599468341468227435366500320429310728447319603358869784508755652651409267874\
        403177222685540952335447673766040761943653108018983707616481813103910439777662812832524770\
        967843102336919727212657839485675206059101381280743768162425186707476963805209773795947202\
        700277096325520775715374637669182730957360363560816979950321699002602976386831381925524802\
        6666854405409059422844776556067163611304891154793770115766608153679099327786"
    );

    /// Generator of the order `Q` subgroup of `Z_P^*`.
    pub static ref G: BigUint = parse_constant(
        "119359756198641231858139651428439585561105914902686985078252796680474637856752833978884422\
        594516170665312423393830118608408063594508087813277769835084746883589963798527237870817233\
        369094387978405585759195339509768803496494994109693743279157584139079471178850751266233150\
        727771094796709619646350222242437970473900636242584673413224137139139346254912172628651028\
        694427789523683070264102332413084663100402635889283790741342401259356660761075766365672754\
        329863241692760862540151023800163269173550320623249398630247531924855997863109776955214403\
        044727497968354022277828136634059011708099779241302941071701051050378539485717425482151777\
        277387633806111112178267035315726401285294598397677116389893642725498831127977915200359151\
        833767358091365292230363248410124916825814514852703770457024102738694375502049388804979035\
        628232209959549199366986471874840784466132903083308458356458177839111623113116525230200791\
        649979270165318729763550486200224695556789081331596212761936863634467236301450039399776963\
        661755684863012396788149479256016157814129329192490798309248914535389650594573156725696657\
        302152874510063002532052622638033113978672254680147128450265983503193865576932419282003012\
        093526302631221491418211528781074474515924597472841036553107847"
    );

    pub static ref Q_MINUS_ONE: BigUint = &*Q - 1u32;
}

fn parse_constant(digits: &str) -> BigUint {
    BigUint::parse_bytes(digits.as_bytes(), 10).expect("electionguard: malformed group constant")
}

macro_rules! field_element {
    ($name:ident, $modulus:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(BigUint);

        impl $name {
            pub fn zero() -> Self {
                $name(BigUint::zero())
            }

            pub fn one() -> Self {
                $name(BigUint::one())
            }

            pub fn two() -> Self {
                $name(BigUint::from(2u32))
            }

            pub fn as_int(&self) -> &BigUint {
                &self.0
            }

            pub fn into_int(self) -> BigUint {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Big-endian uppercase hex, always an even number of digits.
            pub fn to_hex(&self) -> String {
                hex::encode_upper(self.0.to_bytes_be())
            }

            /// Validates that the element is within `[0, modulus)`.
            pub fn is_in_bounds(&self) -> bool {
                self.0 < *$modulus
            }

            /// Validates that the element is within `[1, modulus)`.
            pub fn is_in_bounds_no_zero(&self) -> bool {
                !self.0.is_zero() && self.is_in_bounds()
            }
        }

        impl From<u64> for $name {
            fn from(i: u64) -> Self {
                $name(BigUint::from(i))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:X}", self.0)
            }
        }
    };
}

field_element!(ElementModQ, Q);
field_element!(ElementModP, P);

impl ElementModP {
    /// The group generator `G` as an element.
    pub fn generator() -> Self {
        ElementModP(G.clone())
    }

    /// True if the element is in bounds and a member of the order `Q` subgroup.
    pub fn is_valid_residue(&self) -> bool {
        self.is_in_bounds() && self.0.modpow(&Q, &P).is_one()
    }
}

/// Returns `None` if `i` is not within `[0, Q)`.
pub fn int_to_q(i: BigUint) -> Option<ElementModQ> {
    if i < *Q {
        Some(ElementModQ(i))
    } else {
        None
    }
}

/// Wraps `i` without a bounds check. Never use on externally sourced values.
pub fn int_to_q_unchecked(i: BigUint) -> ElementModQ {
    ElementModQ(i)
}

/// Returns `None` if `i` is not within `[0, P)`.
pub fn int_to_p(i: BigUint) -> Option<ElementModP> {
    if i < *P {
        Some(ElementModP(i))
    } else {
        None
    }
}

/// Wraps `i` without a bounds check. Never use on externally sourced values.
pub fn int_to_p_unchecked(i: BigUint) -> ElementModP {
    ElementModP(i)
}

/// Compares a P element and a Q element by numeric value.
pub fn eq_elems(p: &ElementModP, q: &ElementModQ) -> bool {
    p.0 == q.0
}

pub fn add_q(elems: &[&ElementModQ]) -> ElementModQ {
    let sum = elems
        .iter()
        .fold(BigUint::zero(), |acc, e| (acc + &e.0) % &*Q);
    ElementModQ(sum)
}

/// `(a - b) mod Q`, always non-negative.
pub fn a_minus_b_q(a: &ElementModQ, b: &ElementModQ) -> ElementModQ {
    let b = &b.0 % &*Q;
    ElementModQ((&a.0 + &*Q - b) % &*Q)
}

pub fn negate_q(a: &ElementModQ) -> ElementModQ {
    a_minus_b_q(&ElementModQ::zero(), a)
}

/// `(a + b * c) mod Q`
pub fn a_plus_bc_q(a: &ElementModQ, b: &ElementModQ, c: &ElementModQ) -> ElementModQ {
    ElementModQ((&a.0 + &b.0 * &c.0) % &*Q)
}

/// Product of all elements mod Q. The empty product is one.
pub fn mult_q(elems: &[&ElementModQ]) -> ElementModQ {
    let product = elems
        .iter()
        .fold(BigUint::one(), |acc, e| (acc * &e.0) % &*Q);
    ElementModQ(product)
}

/// Product of all elements mod P. The empty product is one.
pub fn mult_p(elems: &[&ElementModP]) -> ElementModP {
    let product = elems
        .iter()
        .fold(BigUint::one(), |acc, e| (acc * &e.0) % &*P);
    ElementModP(product)
}

pub fn pow_p(base: &ElementModP, exponent: &ElementModQ) -> ElementModP {
    ElementModP(base.0.modpow(&exponent.0, &P))
}

pub fn pow_q(base: &ElementModQ, exponent: &ElementModQ) -> ElementModQ {
    ElementModQ(base.0.modpow(&exponent.0, &Q))
}

/// `G^exponent mod P`
pub fn g_pow_p(exponent: &ElementModQ) -> ElementModP {
    ElementModP(G.modpow(&exponent.0, &P))
}

// Both moduli are prime, so the inverse is `e^(m - 2) mod m`.
fn mult_inv(e: &BigUint, modulus: &BigUint) -> Result<BigUint, Error> {
    let e = e % modulus;
    if e.is_zero() {
        return Err(Error::DivisionByZero);
    }
    Ok(e.modpow(&(modulus - 2u32), modulus))
}

/// Multiplicative inverse mod P. Fails on zero.
pub fn mult_inv_p(e: &ElementModP) -> Result<ElementModP, Error> {
    Ok(ElementModP(mult_inv(&e.0, &P)?))
}

/// Multiplicative inverse mod Q. Fails on zero.
pub fn mult_inv_q(e: &ElementModQ) -> Result<ElementModQ, Error> {
    Ok(ElementModQ(mult_inv(&e.0, &Q)?))
}

/// `a / b mod P`
pub fn div_p(a: &ElementModP, b: &ElementModP) -> Result<ElementModP, Error> {
    let inverse = mult_inv_p(b)?;
    Ok(mult_p(&[a, &inverse]))
}

/// `a / b mod Q`
pub fn div_q(a: &ElementModQ, b: &ElementModQ) -> Result<ElementModQ, Error> {
    let inverse = mult_inv_q(b)?;
    Ok(mult_q(&[a, &inverse]))
}

/// A uniformly random element of `[0, Q)`.
pub fn rand_q() -> ElementModQ {
    // 512 random bits keep the modular bias negligible
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    ElementModQ(BigUint::from_bytes_be(&bytes) % &*Q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(*Q, (BigUint::one() << 256) - 189u32);
        assert_eq!(&*R * &*Q, &*P - 1u32);
        assert!(ElementModP::generator().is_valid_residue());
        assert_eq!(P.bits(), 4096);
    }

    #[test]
    fn test_bounds() {
        assert!(int_to_q(Q.clone()).is_none());
        assert!(int_to_q(&*Q - 1u32).is_some());
        assert!(int_to_p(P.clone()).is_none());
        assert!(ElementModQ::zero().is_in_bounds());
        assert!(!ElementModQ::zero().is_in_bounds_no_zero());
        assert!(!int_to_q_unchecked(Q.clone()).is_in_bounds());
        assert!(!int_to_p_unchecked(P.clone()).is_in_bounds_no_zero());
    }

    #[test]
    fn test_residue() {
        assert!(ElementModP::one().is_valid_residue());
        assert!(g_pow_p(&ElementModQ::from(12345)).is_valid_residue());
        // P - 1 has order 2, so it is not in the order Q subgroup
        assert!(!int_to_p_unchecked(&*P - 1u32).is_valid_residue());
        assert!(!ElementModP::zero().is_valid_residue());
    }

    #[test]
    fn test_q_arithmetic() {
        let a = ElementModQ::from(5);
        let b = ElementModQ::from(7);

        assert_eq!(add_q(&[&a, &b]), ElementModQ::from(12));
        assert_eq!(add_q(&[]), ElementModQ::zero());
        assert_eq!(a_minus_b_q(&b, &a), ElementModQ::two());
        assert_eq!(
            a_minus_b_q(&a, &b),
            int_to_q_unchecked(&*Q - 2u32),
        );
        assert_eq!(add_q(&[&negate_q(&a), &a]), ElementModQ::zero());
        assert_eq!(negate_q(&ElementModQ::zero()), ElementModQ::zero());
        assert_eq!(a_plus_bc_q(&a, &b, &b), ElementModQ::from(54));
        assert_eq!(mult_q(&[&a, &b]), ElementModQ::from(35));
        assert_eq!(mult_q(&[]), ElementModQ::one());
        assert_eq!(pow_q(&ElementModQ::two(), &ElementModQ::from(10)), ElementModQ::from(1024));
        assert_eq!(div_q(&ElementModQ::from(35), &b).unwrap(), a);
    }

    #[test]
    fn test_p_arithmetic() {
        let g = ElementModP::generator();
        assert_eq!(g_pow_p(&ElementModQ::one()), g);
        assert_eq!(g_pow_p(&ElementModQ::zero()), ElementModP::one());
        assert_eq!(mult_p(&[]), ElementModP::one());

        let g2 = g_pow_p(&ElementModQ::two());
        assert_eq!(mult_p(&[&g, &g]), g2);
        assert_eq!(pow_p(&g, &ElementModQ::two()), g2);
        assert_eq!(div_p(&g2, &g).unwrap(), g);

        let inverse = mult_inv_p(&g).unwrap();
        assert_eq!(mult_p(&[&g, &inverse]), ElementModP::one());

        // Exponents live in Z_Q
        assert_eq!(g_pow_p(&negate_q(&ElementModQ::one())), inverse);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            mult_inv_p(&ElementModP::zero()),
            Err(Error::DivisionByZero)
        ));
        assert!(matches!(
            div_p(&ElementModP::one(), &ElementModP::zero()),
            Err(Error::DivisionByZero)
        ));
        assert!(matches!(
            mult_inv_q(&int_to_q_unchecked(Q.clone())),
            Err(Error::DivisionByZero)
        ));
    }

    #[test]
    fn test_hex() {
        assert_eq!(ElementModQ::from(5).to_hex(), "05");
        assert_eq!(ElementModQ::from(0xABCD).to_hex(), "ABCD");
        assert_eq!(ElementModQ::from(0x1FF).to_hex(), "01FF");
        assert_eq!(ElementModQ::from(0x1FF).to_string(), "1FF");
        assert!(eq_elems(&ElementModP::from(9), &ElementModQ::from(9)));
    }

    #[test]
    fn test_rand_q() {
        let a = rand_q();
        let b = rand_q();
        assert!(a.is_in_bounds());
        assert_ne!(a, b);
    }
}
